//! Check command - static permission checks.
//!
//! No entity store is consulted, so only the permission lattice and the
//! self-access rule can grant access to another user's records.

use anyhow::{Result, anyhow};
use authz::{CheckOptions, PermissionEvaluator, Target};
use clap::Args;
use colored::Colorize;
use config::EngineConfig;
use hr_core::{EmptyDirectory, RequestContext, RoleClaim, TenantId, UserId};

use crate::output;

#[derive(Args)]
pub struct CheckArgs {
    /// Requestor role (system_admin, admin, hr, manager, employee)
    #[arg(long)]
    pub role: String,

    /// Resource, e.g. leave-request
    #[arg(long)]
    pub resource: String,

    /// Action: read, create, write, delete, approve, reject, admin
    #[arg(long)]
    pub action: String,

    /// Requestor user id
    #[arg(long, default_value = "cli-user")]
    pub user: String,

    /// Requestor tenant id
    #[arg(long)]
    pub tenant: Option<String>,

    /// Target user id; omit for a level-only check
    #[arg(long)]
    pub target_user: Option<String>,

    /// Treat the target as belonging to another tenant
    #[arg(long)]
    pub cross_tenant: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: CheckArgs, settings: &EngineConfig) -> Result<()> {
    let evaluator = PermissionEvaluator::from_config(EmptyDirectory, settings);

    let user = UserId::new(args.user.as_str())
        .ok_or_else(|| anyhow!("invalid user id {:?}", args.user))?;
    let mut requestor = RequestContext::new(user, RoleClaim::parse(&args.role));
    if let Some(tenant) = &args.tenant {
        requestor.tenant_id = Some(
            TenantId::new(tenant.as_str()).ok_or_else(|| anyhow!("invalid tenant id {tenant:?}"))?,
        );
    }

    let target = args
        .target_user
        .as_deref()
        .map(|id| {
            UserId::new(id)
                .map(Target::user)
                .ok_or_else(|| anyhow!("invalid target user id {id:?}"))
        })
        .transpose()?;
    let options = if args.cross_tenant {
        CheckOptions::cross_tenant()
    } else {
        CheckOptions::default()
    };

    let result = evaluator.check_named(
        &requestor,
        &args.resource,
        &args.action,
        target.as_ref(),
        options,
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let summary = format!(
            "{} {} on {}",
            args.role.bold(),
            args.action,
            args.resource
        );
        if result.authorized {
            output::success(&format!("{summary}: {}", "granted".green()));
        } else {
            output::failure(&format!("{summary}: {}", "denied".red()));
        }
        output::field("reason", &result.reason, "evaluator");
        output::field(
            "permission level",
            &result.permission_level.value().to_string(),
            result.permission_level.name(),
        );
        output::field(
            "required level",
            &result.required_level.value().to_string(),
            result.required_level.name(),
        );
    }

    if !result.authorized {
        std::process::exit(1);
    }
    Ok(())
}
