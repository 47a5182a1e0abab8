pub mod check;
pub mod context;
pub mod resolve;
pub mod settings;
pub mod watch;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use config::EngineConfig;

#[derive(Parser)]
#[command(
    name = "hrgate",
    author,
    version,
    about = "hrgate - layered configuration and permission diagnostics",
    long_about = "Resolve the configuration a tenant, organization or role sees, check \
                  permissions without a running service, and inspect how a request context \
                  is built from token claims.\n\nSettings come from defaults, an optional \
                  settings file and HRG_* environment variables.",
)]
pub struct Cli {
    /// Engine settings file (.toml, .yaml or .yml)
    #[arg(long, global = true, env = "HRG_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Resolve the configuration visible at a hierarchy level")]
    Resolve(resolve::ResolveArgs),

    #[command(about = "Check a permission without entity lookups")]
    Check(check::CheckArgs),

    #[command(about = "Build a request context from token claims and show its sources")]
    Context(context::ContextArgs),

    #[command(about = "Show the effective engine settings")]
    Settings(settings::SettingsArgs),

    #[command(about = "Watch the configuration root and re-resolve on change")]
    Watch(watch::WatchArgs),
}

pub fn load_settings(cli: &Cli) -> Result<EngineConfig> {
    config::load(cli.config.as_deref(), None).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load settings from {}", path.display()),
        None => "Failed to load settings from the environment".to_string(),
    })
}

/// Parse `name=value` pairs given on the command line.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got {raw:?}")),
    }
}
