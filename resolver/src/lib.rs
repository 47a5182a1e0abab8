//! # Layered Configuration Resolution
//!
//! Resolves the configuration visible to a request from `KEY=VALUE`
//! fragments organised in four levels:
//!
//! ```text
//! <root>/platform/*.env
//! <root>/tenants/<tenant>/*.env
//! <root>/tenants/<tenant>/organizations/<org>/*.env
//! <root>/tenants/<tenant>/organizations/<org>/users/<role>/*.env
//! ```
//!
//! Later levels override earlier ones key by key. The merged result is
//! checked against required keys, filtered for the viewer by the
//! [`filter`] module and cached for a fixed TTL.
//!
//! ## Usage
//! ```rust,no_run
//! use resolver::{ConfigResolver, ResolutionRequest};
//!
//! # async fn run() -> Result<(), errors::ResolutionError> {
//! let resolver = ConfigResolver::new("./config");
//! let request = ResolutionRequest::platform()
//!     .with_tenant("acme")
//!     .with_organization("sales")
//!     .with_role("hr");
//! let config = resolver.resolve(&request).await?;
//! println!("theme: {:?}", config.get("UI_THEME"));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod filter;
pub mod fragment;
pub mod merge;
pub mod request;
pub mod resolver;
pub mod schema;
pub mod secret_policy;
pub mod watch;

pub use cache::{CacheStats, ConfigCache};
pub use filter::{SecretClass, Viewer, classify, filter_for_context};
pub use fragment::{FragmentStore, parse_fragment};
pub use merge::{ConfigMap, merge_fragments};
pub use request::{LevelAddress, ResolutionRequest};
pub use resolver::{ConfigResolver, ResolvedConfig};
pub use schema::RequiredKeys;
pub use secret_policy::{PolicyRule, PolicyViolation, SecretPolicy};
pub use watch::spawn_cache_invalidation;
