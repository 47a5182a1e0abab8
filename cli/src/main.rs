use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = commands::load_settings(&cli)?;

    // RUST_LOG wins; otherwise the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.observability.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Resolve(args) => commands::resolve::run(args, settings).await,
        Commands::Check(args) => commands::check::run(args, &settings),
        Commands::Context(args) => commands::context::run(args),
        Commands::Settings(args) => commands::settings::run(args, &settings),
        Commands::Watch(args) => commands::watch::run(args, settings).await,
    }
}
