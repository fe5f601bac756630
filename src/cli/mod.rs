pub mod build;
pub mod completions;
pub mod init;
pub mod watch;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{ConfigFile, Overrides, SpriteConfig, CONFIG_FILENAME};
use crate::error::Result;

/// icon-sprite - SVG icon sprite generator
#[derive(Parser, Debug)]
#[command(name = "icon-sprite")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Show debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the sprite once
    Build(build::BuildArgs),

    /// Generate the sprite and regenerate it whenever an icon changes
    Watch(watch::WatchArgs),

    /// Create an icon-sprite.yaml config file
    Init(init::InitArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Source, output and config options shared by `build` and `watch`.
#[derive(Args, Debug, Clone, Default)]
pub struct SpriteArgs {
    /// Directory containing the SVG icons
    #[arg(long, short)]
    pub source: Option<PathBuf>,

    /// Directory the sprite is written to
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Config file
    #[arg(long, short, default_value = CONFIG_FILENAME)]
    pub config: PathBuf,
}

impl SpriteArgs {
    /// Load the config file (if present) and apply the flags on top.
    pub fn load(&self, debounce_ms: Option<u64>) -> Result<SpriteConfig> {
        let file = ConfigFile::load_or_default(&self.config)?;
        file.into_config(Overrides {
            source_dir: self.source.clone(),
            output_dir: self.output.clone(),
            debounce_ms,
        })
    }
}
