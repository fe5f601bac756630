use clap::Parser;
use icon_sprite::cli::{Cli, Commands};
use icon_sprite::output::Printer;
use miette::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "icon_sprite=debug" } else { "icon_sprite=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let printer = Printer::new();

    match cli.command {
        Commands::Build(args) => icon_sprite::cli::build::run(args, &printer)?,
        Commands::Watch(args) => icon_sprite::cli::watch::run(args, &printer)?,
        Commands::Init(args) => icon_sprite::cli::init::run(args, &printer)?,
        Commands::Completions(args) => icon_sprite::cli::completions::run(args)?,
    }

    Ok(())
}
