//! Init command implementation.
//!
//! Writes a starter `icon-sprite.yaml`, guessing the icon directory from
//! the SVG files found under the project.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use walkdir::WalkDir;

use crate::config::CONFIG_FILENAME;
use crate::error::{Result, SpriteError};
use crate::output::{plural, Printer};
use crate::scanner::is_icon_path;

/// Directories never suggested as an icon source.
const IGNORED_DIRS: [&str; 4] = ["node_modules", "target", ".git", "dist"];

/// Create an icon-sprite.yaml config file
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Icon directory to record instead of the detected one
    #[arg(long, short)]
    pub source: Option<PathBuf>,

    /// Output directory to record
    #[arg(long, short, default_value = "public")]
    pub output: PathBuf,

    /// Overwrite an existing icon-sprite.yaml
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, printer: &Printer) -> Result<()> {
    let config_path = args.path.join(CONFIG_FILENAME);

    if config_path.exists() && !args.force {
        return Err(SpriteError::Config {
            message: format!("{} already exists", CONFIG_FILENAME),
            help: Some("Use --force to overwrite".to_string()),
        });
    }

    let (source, count) = match args.source {
        Some(source) => (source, None),
        None => {
            let (dir, count) = detect_icon_dir(&args.path);
            (dir, Some(count))
        }
    };

    let yaml = format!(
        "source_dir: {}\noutput_dir: {}\ndebounce_ms: 100\n",
        source.display(),
        args.output.display()
    );

    fs::write(&config_path, &yaml).map_err(|e| {
        SpriteError::io(&config_path, format!("Failed to write config: {}", e))
    })?;

    if let Some(count) = count {
        printer.info(
            "Detected",
            &format!("{} ({})", source.display(), plural(count, "icon", "icons")),
        );
    }
    printer.success("Created", CONFIG_FILENAME);

    Ok(())
}

/// Find the directory holding the most SVG files, relative to `root`.
///
/// Falls back to `icons` when the project has none.
fn detect_icon_dir(root: &Path) -> (PathBuf, usize) {
    let mut counts: BTreeMap<PathBuf, usize> = BTreeMap::new();

    let walker = WalkDir::new(root).into_iter().filter_entry(|e| {
        e.depth() == 0
            || !e
                .file_name()
                .to_str()
                .map(|name| IGNORED_DIRS.contains(&name))
                .unwrap_or(false)
    });

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() || !is_icon_path(entry.path()) {
            continue;
        }
        if let Some(parent) = entry.path().parent() {
            let relative = parent.strip_prefix(root).unwrap_or(parent).to_path_buf();
            *counts.entry(relative).or_default() += 1;
        }
    }

    // Highest count wins; ties go to the shallowest, then alphabetical path.
    counts
        .into_iter()
        .max_by(|(a_dir, a), (b_dir, b)| {
            a.cmp(b)
                .then_with(|| b_dir.components().count().cmp(&a_dir.components().count()))
                .then_with(|| b_dir.cmp(a_dir))
        })
        .map(|(dir, count)| {
            if dir.as_os_str().is_empty() {
                (PathBuf::from("."), count)
            } else {
                (dir, count)
            }
        })
        .unwrap_or_else(|| (PathBuf::from("icons"), 0))
}
