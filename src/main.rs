//! Snapbooth CLI
//!
//! Command-line front end for running booth sessions and composing collages.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use snapbooth::cli::commands;
use snapbooth::cli::{Cli, Commands};
use snapbooth::BoothConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Snapbooth v{}", env!("CARGO_PKG_VERSION"));

    let (config, sources) =
        BoothConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if !sources.env_overrides.is_empty() {
        info!("Environment overrides: {}", sources.env_overrides.join(", "));
    }

    match cli.command {
        Some(cmd) => handle_command(&config, cmd),
        None => {
            println!("Snapbooth v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(config: &BoothConfig, cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Limits => commands::show_limits()?,
        Commands::Session {
            layout,
            orientation,
            select,
            frames,
        } => commands::run_session(config, layout, orientation, select, frames.as_deref())
            .with_context(|| format!("{} {} session failed", layout, orientation))?,
        Commands::Compose {
            files,
            layout,
            orientation,
            out,
        } => commands::compose_files(config, &files, layout, orientation, &out)
            .with_context(|| format!("failed to compose {}", out.display()))?,
        Commands::List => commands::list_photos(config).context("failed to list photos")?,
    }
    Ok(())
}
