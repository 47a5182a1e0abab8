//! Request context building for the HR engine.
//!
//! Turns the decoded claims of an already-verified token into a
//! [`hr_core::RequestContext`], applying header and path-parameter overrides
//! with precedence:
//! 1. Path parameters (`tenant_slug`, `organization_slug`, ...)
//! 2. Headers (`x-tenant-slug`, `x-organization-slug`, ...)
//! 3. Token claims
//!
//! Every field remembers where its value came from, see
//! [`ResolvedContext::explain`].
//!
//! Token verification is not done here; revoked token ids are rejected
//! through a shared [`TokenBlacklist`].

pub mod blacklist;
pub mod builder;
pub mod claims;
pub mod types;

pub use blacklist::TokenBlacklist;
pub use builder::{
    ContextBuilder, HEADER_ORGANIZATION_ID, HEADER_ORGANIZATION_SLUG, HEADER_TENANT_ID,
    HEADER_TENANT_SLUG, PARAM_ORGANIZATION_ID, PARAM_ORGANIZATION_SLUG, PARAM_TENANT_ID,
    PARAM_TENANT_SLUG,
};
pub use claims::TokenClaims;
pub use types::{ContextSource, ResolvedContext, ResolvedValue};
