//! Configuration: the `icon-sprite.yaml` file and the resolved settings a
//! plugin is built from.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpriteError};
use crate::optimize::OptimizerConfig;
use crate::sprite::SPRITE_FILENAME;

/// The name of the config file looked up in the working directory.
pub const CONFIG_FILENAME: &str = "icon-sprite.yaml";

/// Default debounce window for the change watcher.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// Settings for one sprite. Immutable once handed to a plugin.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteConfig {
    /// Directory scanned for icons.
    pub source_dir: PathBuf,
    /// Directory the sprite is written to.
    pub output_dir: PathBuf,
    /// Options for the built-in optimizer.
    pub optimizer: OptimizerConfig,
    /// Quiet period before a change triggers regeneration.
    pub debounce: Duration,
    /// Fail the build when the initial pass fails.
    pub strict: bool,
}

/// Absolute directories for a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl ResolvedPaths {
    pub fn output_file(&self) -> PathBuf {
        self.output_dir.join(SPRITE_FILENAME)
    }
}

impl SpriteConfig {
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            optimizer: OptimizerConfig::default(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            strict: true,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Check that both directories are set.
    pub fn validate(&self) -> Result<()> {
        if self.source_dir.as_os_str().is_empty() || self.output_dir.as_os_str().is_empty() {
            return Err(SpriteError::Config {
                message: "Both the source directory for SVG icons and the output directory must be specified".to_string(),
                help: Some(format!(
                    "Set source_dir and output_dir in {} or pass --source and --output",
                    CONFIG_FILENAME
                )),
            });
        }
        Ok(())
    }

    /// Resolve both directories against the current working directory.
    pub fn resolve(&self) -> Result<ResolvedPaths> {
        let cwd = std::env::current_dir()
            .map_err(|e| SpriteError::io(".", format!("Failed to read working directory: {}", e)))?;
        self.resolve_in(&cwd)
    }

    /// Resolve both directories against `base`. Absolute paths are kept.
    pub fn resolve_in(&self, base: &Path) -> Result<ResolvedPaths> {
        self.validate()?;
        Ok(ResolvedPaths {
            source_dir: base.join(&self.source_dir),
            output_dir: base.join(&self.output_dir),
        })
    }
}

/// Contents of `icon-sprite.yaml`. Every key is optional so the file can
/// be combined with command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub source_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub debounce_ms: Option<u64>,
    pub strict: Option<bool>,
    pub optimizer: OptimizerConfig,
}

/// Values given on the command line. They win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub debounce_ms: Option<u64>,
}

impl ConfigFile {
    /// Load the config from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SpriteError::io(path, format!("Failed to read config: {}", e))
        })?;

        Self::parse(&content)
    }

    /// Load `path` if it exists, the defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse the config from a YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| SpriteError::Parse {
            message: format!("Invalid config: {}", e),
            help: Some(format!("Check {} syntax", CONFIG_FILENAME)),
        })
    }

    /// Merge command-line overrides and build the final config.
    pub fn into_config(self, overrides: Overrides) -> Result<SpriteConfig> {
        let source_dir = overrides.source_dir.or(self.source_dir).unwrap_or_default();
        let output_dir = overrides.output_dir.or(self.output_dir).unwrap_or_default();
        let debounce_ms = overrides
            .debounce_ms
            .or(self.debounce_ms)
            .unwrap_or(DEFAULT_DEBOUNCE_MS);

        let config = SpriteConfig::new(source_dir, output_dir)
            .with_optimizer(self.optimizer)
            .with_debounce(Duration::from_millis(debounce_ms))
            .with_strict(self.strict.unwrap_or(true));

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config = ConfigFile::parse("source_dir: src/icons\noutput_dir: public").unwrap();

        assert_eq!(config.source_dir, Some(PathBuf::from("src/icons")));
        assert_eq!(config.output_dir, Some(PathBuf::from("public")));
        assert!(config.debounce_ms.is_none());
        assert_eq!(config.optimizer, OptimizerConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
source_dir: assets/icons
output_dir: dist/sprites
debounce_ms: 250
strict: false
optimizer:
  remove_attrs: [width, height]
  convert_shapes: false
"#;
        let config = ConfigFile::parse(yaml).unwrap();

        assert_eq!(config.debounce_ms, Some(250));
        assert_eq!(config.strict, Some(false));
        assert_eq!(config.optimizer.remove_attrs, vec!["width", "height"]);
        assert!(!config.optimizer.convert_shapes);
        assert!(config.optimizer.remove_comments);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = ConfigFile::parse("").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_parse_unknown_key() {
        let err = ConfigFile::parse("icons: src/icons").unwrap_err();
        assert!(matches!(err, SpriteError::Parse { .. }));
    }

    #[test]
    fn test_overrides_win() {
        let file = ConfigFile::parse("source_dir: a\noutput_dir: b\ndebounce_ms: 500").unwrap();
        let config = file
            .into_config(Overrides {
                source_dir: Some(PathBuf::from("c")),
                output_dir: None,
                debounce_ms: Some(20),
            })
            .unwrap();

        assert_eq!(config.source_dir, PathBuf::from("c"));
        assert_eq!(config.output_dir, PathBuf::from("b"));
        assert_eq!(config.debounce, Duration::from_millis(20));
        assert!(config.strict);
    }

    #[test]
    fn test_missing_directories_are_fatal() {
        let err = ConfigFile::parse("source_dir: icons")
            .unwrap()
            .into_config(Overrides::default())
            .unwrap_err();

        assert!(err.is_config());
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let config = SpriteConfig::new("icons", "/tmp/out");
        let paths = config.resolve_in(Path::new("/project")).unwrap();

        assert_eq!(paths.source_dir, PathBuf::from("/project/icons"));
        assert_eq!(paths.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(
            paths.output_file(),
            PathBuf::from("/tmp/out/icon-sprite.svg")
        );
    }

    #[test]
    fn test_default_debounce() {
        let config = SpriteConfig::new("a", "b");
        assert_eq!(config.debounce, Duration::from_millis(100));
    }
}
