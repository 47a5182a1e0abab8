//! # HR Engine Core
//!
//! Shared types and traits for the configuration and authorization engine.
//!
//! This crate provides:
//! - Closed enumerations for roles, resources, actions and permission levels
//! - The hierarchy and access-scope model used by the resolver, the filter,
//!   the evaluator and the middleware
//! - The per-request [`RequestContext`]
//! - Entity records and the [`EntityLookup`] trait consumed by the evaluator

pub mod context;
pub mod entities;
pub mod traits;
pub mod types;

pub use context::RequestContext;
pub use entities::{Employee, MemberRole, Organization, OrganizationMember, User};
pub use traits::{EmptyDirectory, EntityLookup};
pub use types::{
    AccessScope, Action, HierarchyLevel, OrganizationId, PermissionLevel, Resource, Role,
    RoleClaim, TenantId, UserId, is_valid_slug,
};
