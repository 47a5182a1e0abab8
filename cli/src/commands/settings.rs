use anyhow::Result;
use clap::{Args, ValueEnum};
use config::EngineConfig;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum Format {
    #[default]
    Toml,
    Yaml,
    Json,
}

#[derive(Args)]
pub struct SettingsArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Toml)]
    pub format: Format,
}

pub fn run(args: SettingsArgs, settings: &EngineConfig) -> Result<()> {
    let rendered = match args.format {
        Format::Toml => toml::to_string_pretty(settings)?,
        Format::Yaml => serde_yaml::to_string(settings)?,
        Format::Json => serde_json::to_string_pretty(settings)?,
    };
    println!("{rendered}");
    Ok(())
}
