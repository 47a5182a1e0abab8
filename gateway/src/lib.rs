//! # Access Middleware
//!
//! Per-request orchestration of the engine:
//!
//! 1. Build the [`hr_core::RequestContext`] from decoded token claims and
//!    header/path overrides
//! 2. Let public routes straight through
//! 3. Compare the route's [`SecurityScope`] with the caller's access scope
//! 4. Optionally check a `(Resource, Action)` pair with the evaluator
//! 5. Resolve and filter the configuration the context addresses
//! 6. Attach an [`AccessGrant`] to the request and write an audit record
//!
//! [`AccessGate`] holds the logic; [`enforce_access`] adapts it to `axum`.
//! Token verification happens upstream: the middleware expects a
//! [`context::TokenClaims`] in the request extensions.

pub mod error;
pub mod gate;
pub mod middleware;
pub mod route;

pub use error::AccessError;
pub use gate::{AccessGate, AccessGrant};
pub use middleware::{AccessLayer, enforce_access};
pub use route::{RouteRequirement, SecurityScope};
