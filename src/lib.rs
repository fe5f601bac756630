//! icon-sprite - SVG icon sprite generator
//!
//! Scans a directory tree for SVG icons, optimizes each one and joins them
//! into a single hidden sprite sheet whose icons are referenced by id.
//! During development a debounced watcher regenerates the sprite and asks
//! the dev server to reload.

pub mod cli;
pub mod config;
pub mod error;
pub mod optimize;
pub mod output;
pub mod plugin;
pub mod scanner;
pub mod sprite;
pub mod watch;

pub use config::{ConfigFile, Overrides, ResolvedPaths, SpriteConfig, CONFIG_FILENAME};
pub use error::{Result, SpriteError};
pub use optimize::{Optimizer, OptimizerConfig, SvgOptimizer};
pub use plugin::IconSpritePlugin;
pub use scanner::{icon_id, is_icon_path, scan_icons, IconEntry};
pub use sprite::{assemble, to_symbol, PassReport, SkippedIcon, SpriteGenerator, SPRITE_FILENAME};
pub use watch::{ChangeTrigger, ChangeWatcher, DevServer, IconGlob, NotifyServer, Reload, WatchState};
