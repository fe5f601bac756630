//! Watch command implementation.
//!
//! Generates the sprite, then keeps regenerating it as icons change until
//! interrupted with Ctrl+C.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Args;
use tracing::error;

use crate::error::{Result, SpriteError};
use crate::output::{display_path, Printer};
use crate::plugin::IconSpritePlugin;
use crate::watch::{NotifyServer, Reload};

use super::build::report_pass;
use super::SpriteArgs;

/// Generate the sprite and regenerate it whenever an icon changes
#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub sprite: SpriteArgs,

    /// Quiet period in milliseconds before regenerating
    #[arg(long)]
    pub debounce: Option<u64>,
}

/// Reports reloads on the terminal; the standalone server has no clients.
struct TerminalReload {
    printer: Printer,
}

impl Reload for TerminalReload {
    fn full_reload(&self) {
        self.printer.info("Reloading", "icon sprite regenerated");
    }
}

pub fn run(args: WatchArgs, printer: &Printer) -> Result<()> {
    let config = args.sprite.load(args.debounce)?;
    let mut plugin = IconSpritePlugin::new(config)?;

    // Configuration problems stop the command; a failed first pass does not.
    match plugin.build_start() {
        Ok(Some(report)) => report_pass(&report, printer),
        Ok(None) => {}
        Err(e) if e.is_config() => return Err(e),
        Err(e) => error!("Initial icon sprite generation failed: {}", e),
    }

    let mut server = NotifyServer::new(Arc::new(TerminalReload { printer: *printer }))?;
    plugin.configure_server(&mut server)?;

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst)).map_err(|e| {
        SpriteError::Watch {
            message: format!("Failed to install Ctrl+C handler: {}", e),
        }
    })?;

    printer.status(
        "Watching",
        &format!("{} (Ctrl+C to stop)", display_path(&plugin.config().source_dir)),
    );
    server.run(&running)?;
    printer.info("Stopped", "watcher shut down");

    Ok(())
}
