//! Resolve command - show the configuration a hierarchy address sees.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use config::EngineConfig;
use resolver::{ConfigMap, ConfigResolver, ResolutionRequest, SecretPolicy, classify};

use crate::output;

#[derive(Args)]
pub struct ResolveArgs {
    /// Configuration root (overrides settings)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Tenant slug
    #[arg(long)]
    pub tenant: Option<String>,

    /// Organization slug (requires --tenant)
    #[arg(long)]
    pub org: Option<String>,

    /// Role level (requires --tenant and --org); also the role the result is filtered for
    #[arg(long)]
    pub role: Option<String>,

    /// Show the merged configuration before security filtering
    #[arg(long)]
    pub unfiltered: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ResolveArgs {
    pub fn request(&self) -> ResolutionRequest {
        let mut request = ResolutionRequest::platform();
        request.tenant_slug = self.tenant.clone();
        request.organization_slug = self.org.clone();
        request.user_role = self.role.clone();
        request
    }
}

pub async fn run(args: ResolveArgs, mut settings: EngineConfig) -> Result<()> {
    if let Some(root) = &args.root {
        settings.resolver.config_root = root.clone();
    }
    let resolver = ConfigResolver::from_config(&settings).with_cache_enabled(false);
    let request = args.request();

    let (level, values) = if args.unfiltered {
        let merged = resolver.merged(&request).await?;
        (None, merged)
    } else {
        let resolved = resolver.resolve(&request).await?;
        (Some(resolved.level), resolved.values.clone())
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "level": level.map(|l| l.to_string()),
                "values": values,
            }))?
        );
        return Ok(());
    }

    let title = match level {
        Some(level) => format!("Resolved configuration ({level} level)"),
        None => "Merged configuration (unfiltered)".to_string(),
    };
    output::header(&title);
    println!();
    print_values(&values);

    if args.unfiltered {
        let violations = SecretPolicy::from(&settings.secret_policy).evaluate(&values);
        if !violations.is_empty() {
            println!();
            for violation in violations {
                output::warn(&format!("{}: {}", violation.key, violation.rule));
            }
        }
    }

    if values.is_empty() {
        output::hint(&format!(
            "no fragments found under {}",
            settings.resolver.config_root.display()
        ));
    }
    Ok(())
}

fn print_values(values: &ConfigMap) {
    let width = values.keys().map(String::len).max().unwrap_or(0);
    for (key, value) in values {
        let line = format!("  {key:<width$} = {value}");
        if classify(key).is_some() {
            println!("{}", line.yellow());
        } else {
            println!("{line}");
        }
    }
}
