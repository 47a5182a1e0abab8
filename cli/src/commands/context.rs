use anyhow::{Context as _, Result};
use clap::Args;
use context::{ContextBuilder, TokenClaims};
use hr_core::RequestContext;

use super::parse_key_value;
use crate::output;

#[derive(Args)]
pub struct ContextArgs {
    /// Decoded token claims as JSON, e.g. '{"sub":"u1","role":"hr","tenantSlug":"acme"}'
    #[arg(long)]
    pub token: String,

    /// Request header override, NAME=VALUE (repeatable)
    #[arg(long = "header", value_parser = parse_key_value)]
    pub headers: Vec<(String, String)>,

    /// Path parameter override, NAME=VALUE (repeatable)
    #[arg(long = "param", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ContextArgs) -> Result<()> {
    let claims: TokenClaims =
        serde_json::from_str(&args.token).context("--token is not a valid claims object")?;

    let resolved = ContextBuilder::new()
        .with_headers(args.headers)
        .with_path_params(args.params)
        .build(&claims)?;

    if args.json {
        let sources: Vec<_> = resolved
            .explain()
            .into_iter()
            .map(|(name, value, source)| {
                serde_json::json!({
                    "name": name,
                    "value": value,
                    "source": source
                })
            })
            .collect();
        let ctx = RequestContext::from(&resolved);
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "context": ctx,
                "accessScope": ctx.access_scope().to_string(),
                "sources": sources,
            }))?
        );
        return Ok(());
    }

    output::header("Request Context");
    println!();
    for (name, value, source) in resolved.explain() {
        output::field(&name, &value, &source);
    }
    println!();
    output::field(
        "access_scope",
        &resolved.to_request_context().access_scope().to_string(),
        "derived",
    );
    Ok(())
}
