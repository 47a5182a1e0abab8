//! Watch command - keep re-resolving one address while fragments change.
//!
//! The resolver's cache is invalidated by the file watcher, so between
//! changes every tick is a cache hit.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;
use config::{EngineConfig, watch_config_root};
use resolver::{ConfigMap, ConfigResolver, spawn_cache_invalidation};
use tracing::warn;

use super::resolve::ResolveArgs;
use crate::output;

#[derive(Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub target: ResolveArgs,

    /// Seconds between resolutions
    #[arg(long, default_value_t = 2)]
    pub interval: u64,

    /// Print cache statistics on every tick
    #[arg(long)]
    pub stats: bool,
}

pub async fn run(args: WatchArgs, mut settings: EngineConfig) -> Result<()> {
    if let Some(root) = &args.target.root {
        settings.resolver.config_root = root.clone();
    }
    let root: PathBuf = settings.resolver.config_root.clone();
    let resolver = Arc::new(ConfigResolver::from_config(&settings));
    let events =
        watch_config_root(&root).with_context(|| format!("Failed to watch {}", root.display()))?;
    let invalidation = spawn_cache_invalidation(Arc::clone(&resolver), events);

    output::header(&format!("Watching {}", root.display()));
    output::hint("press Ctrl-C to stop");

    let request = args.target.request();
    let mut previous: Option<ConfigMap> = None;
    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval.max(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match resolver.resolve(&request).await {
                    Ok(resolved) => {
                        if previous.as_ref() != Some(&resolved.values) {
                            print_changes(previous.as_ref(), &resolved.values);
                            previous = Some(resolved.values.clone());
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Resolution failed");
                        output::warn(&e.to_string());
                    }
                }
                if args.stats {
                    let stats = resolver.cache_stats();
                    println!(
                        "{}",
                        format!(
                            "  cache: {} entries, {} hits, {} misses, {} expired",
                            stats.entries, stats.hits, stats.misses, stats.expired
                        )
                        .dimmed()
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => break
        }
    }

    invalidation.abort();
    Ok(())
}

fn print_changes(previous: Option<&ConfigMap>, current: &ConfigMap) {
    let Some(previous) = previous else {
        println!();
        for (key, value) in current {
            println!("  {key} = {value}");
        }
        return;
    };

    let keys: BTreeSet<&String> = previous.keys().chain(current.keys()).collect();
    println!();
    for key in keys {
        match (previous.get(key), current.get(key)) {
            (None, Some(new)) => println!("{}", format!("+ {key} = {new}").green()),
            (Some(old), None) => println!("{}", format!("- {key} = {old}").red()),
            (Some(old), Some(new)) if old != new => {
                println!("{}", format!("~ {key} = {new} (was {old})").yellow());
            }
            _ => {}
        }
    }
}
