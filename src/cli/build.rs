//! Build command implementation.
//!
//! Runs the plugin's build hook once and reports the result.

use clap::Args;

use crate::error::Result;
use crate::output::{display_path, plural, Printer};
use crate::plugin::IconSpritePlugin;
use crate::sprite::PassReport;

use super::SpriteArgs;

/// Generate the sprite once
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub sprite: SpriteArgs,
}

pub fn run(args: BuildArgs, printer: &Printer) -> Result<()> {
    let config = args.sprite.load(None)?;
    printer.status("Scanning", &display_path(&config.source_dir));

    let plugin = IconSpritePlugin::new(config)?;
    if let Some(report) = plugin.build_start()? {
        report_pass(&report, printer);
    }

    Ok(())
}

/// Print the outcome of a generation pass.
pub fn report_pass(report: &PassReport, printer: &Printer) {
    for skipped in &report.skipped {
        printer.error("Skipped", &format!("{} ({})", display_path(&skipped.path), skipped.reason));
    }

    match &report.output {
        Some(path) => printer.success(
            "Generated",
            &format!(
                "{} with {}",
                display_path(path),
                plural(report.included, "icon", "icons")
            ),
        ),
        None if report.found == 0 => printer.warning("Empty", "no icons found, sprite not written"),
        None => printer.warning("Unchanged", "every icon failed, sprite not written"),
    }
}
