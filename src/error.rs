use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for icon-sprite operations
#[derive(Error, Diagnostic, Debug)]
pub enum SpriteError {
    #[error("Configuration error: {message}")]
    #[diagnostic(code(icon_sprite::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(icon_sprite::io))]
    Io { path: PathBuf, message: String },

    #[error("Failed to optimize {path}: {message}")]
    #[diagnostic(code(icon_sprite::optimize))]
    Optimize { path: PathBuf, message: String },

    #[error("Duplicate icon id '{id}' for {first} and {second}")]
    #[diagnostic(
        code(icon_sprite::duplicate_id),
        help("Rename one of the files so their ids differ")
    )]
    DuplicateId {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Watch error: {message}")]
    #[diagnostic(code(icon_sprite::watch))]
    Watch { message: String },

    #[error("Parse error: {message}")]
    #[diagnostic(code(icon_sprite::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl SpriteError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        SpriteError::Config {
            message: message.into(),
            help: None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        SpriteError::Io {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this is a pre-flight configuration error.
    ///
    /// Configuration errors are fatal in every mode; everything else is
    /// recoverable at the pass level.
    pub fn is_config(&self) -> bool {
        matches!(self, SpriteError::Config { .. })
    }
}

pub type Result<T> = std::result::Result<T, SpriteError>;
