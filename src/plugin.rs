//! Build tool integration.
//!
//! [`IconSpritePlugin`] exposes the two hooks a host build tool calls:
//! [`build_start`](IconSpritePlugin::build_start) before a build and
//! [`configure_server`](IconSpritePlugin::configure_server) once per
//! development server.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::config::SpriteConfig;
use crate::error::Result;
use crate::optimize::{Optimizer, SvgOptimizer};
use crate::sprite::{PassReport, SpriteGenerator};
use crate::watch::{ChangeWatcher, DevServer, IconGlob};

/// Generates the icon sprite for a host build tool and its dev server.
pub struct IconSpritePlugin {
    generator: Arc<SpriteGenerator>,
    watcher: Option<ChangeWatcher>,
}

impl IconSpritePlugin {
    pub const NAME: &'static str = "icon-sprite";

    /// Create a plugin using the built-in optimizer.
    pub fn new(config: SpriteConfig) -> Result<Self> {
        let optimizer = SvgOptimizer::new(config.optimizer.clone());
        Self::with_optimizer(config, Arc::new(optimizer))
    }

    /// Create a plugin with a custom optimizer.
    pub fn with_optimizer(config: SpriteConfig, optimizer: Arc<dyn Optimizer>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            generator: Arc::new(SpriteGenerator::new(config, optimizer)),
            watcher: None,
        })
    }

    pub fn config(&self) -> &SpriteConfig {
        self.generator.config()
    }

    /// Run one generation pass before the build proceeds.
    ///
    /// Configuration errors always propagate. Other failures propagate in
    /// strict mode and are logged otherwise, returning `Ok(None)`.
    pub fn build_start(&self) -> Result<Option<PassReport>> {
        match self.generator.generate() {
            Ok(report) => Ok(Some(report)),
            Err(e) if e.is_config() || self.config().strict => Err(e),
            Err(e) => {
                error!("Icon sprite generation failed: {}", e);
                Ok(None)
            }
        }
    }

    /// Hook the plugin into a development server.
    ///
    /// Registers the icon glob with the server and regenerates the sprite,
    /// debounced, whenever an icon changes. Calling this again replaces the
    /// previous watcher.
    pub fn configure_server(&mut self, server: &mut dyn DevServer) -> Result<()> {
        let paths = self.config().resolve()?;
        let output_file = self.generator.output_file()?;
        let glob = IconGlob::new(&paths.source_dir);

        server.watch(&glob)?;

        // Stop the previous worker before a new one starts writing.
        self.watcher = None;

        let generator = self.generator.clone();
        let watcher = ChangeWatcher::spawn(
            self.config().debounce,
            output_file,
            move || generator.generate(),
            server.reloader(),
        )?;

        let trigger = watcher.trigger();
        server.on_change(Box::new(move |path: &Path| {
            trigger.notify(path);
        }));

        info!("Watching {}", glob);
        self.watcher = Some(watcher);
        Ok(())
    }

    /// Whether `configure_server` has armed a watcher.
    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }
}
