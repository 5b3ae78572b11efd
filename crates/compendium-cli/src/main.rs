//! Compendium CLI: the `compendium` command.

mod cli;
mod commands;
mod config;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let cli = Cli::parse();
    let config = support::load_config_or_exit(&cli.config);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter(cli.verbose)));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init { path, json } => commands::init::run(path, json),

        Commands::Apply {
            batch,
            blocks,
            versions,
            dry_run,
            json,
        } => commands::apply::run(
            &config,
            commands::apply::Args {
                batch,
                blocks,
                versions,
                dry_run,
                json,
            },
        ),

        Commands::Index {
            document,
            versions,
            json,
        } => commands::index::run(&config, document, versions, json),

        Commands::Render { entries, out, json } => commands::render::run(entries, out, json),

        Commands::Versions { versions, json } => commands::versions::run(&config, versions, json),
    }
}
