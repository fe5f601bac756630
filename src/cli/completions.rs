//! Shell completions generation.

use std::path::PathBuf;

use clap::{Args, CommandFactory};
use clap_complete::Shell;

use crate::error::{Result, SpriteError};

use super::Cli;

const BIN_NAME: &str = "icon-sprite";

/// Generate shell completions
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script into this directory instead of stdout
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

pub fn run(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();

    match args.dir {
        Some(dir) => {
            let path = clap_complete::generate_to(args.shell, &mut cmd, BIN_NAME, &dir)
                .map_err(|e| SpriteError::io(&dir, format!("Failed to write completions: {}", e)))?;
            eprintln!("Wrote {}", path.display());
        }
        None => clap_complete::generate(args.shell, &mut cmd, BIN_NAME, &mut std::io::stdout()),
    }

    Ok(())
}
