//! # Engine Errors
//!
//! Error taxonomy shared by the configuration resolver, the context builder
//! and the entity-lookup boundary.
//!
//! Authorization denials are deliberately absent: they are data
//! (`AuthorizationResult`), not errors.

use std::path::PathBuf;

use thiserror::Error;

/// Malformed or hierarchy-inconsistent request context.
///
/// Always surfaced synchronously to the caller and never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("Cannot address the {level} level without a {missing}")]
    InvalidHierarchy { level: String, missing: String },

    #[error("Unknown role: {role}")]
    UnknownRole { role: String },

    #[error("Invalid {field}: {value:?}")]
    InvalidSlug { field: String, value: String },

    #[error("Missing required claim: {claim}")]
    MissingClaim { claim: String },

    #[error("Token {jti} has been revoked")]
    TokenRevoked { jti: String },

    #[error("Caller may not override {field} to {value:?}")]
    OverrideNotPermitted { field: String, value: String },
}

/// Failures while resolving a layered configuration.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("Incomplete configuration: required key {key} missing at {level} level")]
    IncompleteConfiguration { key: String, level: String },

    #[error("Failed to read fragment {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Fragment path escapes the configuration root: {path}")]
    PathTraversal { path: PathBuf },
}

impl ResolutionError {
    /// Whether the failure was caused by the caller's input rather than by
    /// the engine or its storage.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ResolutionError::Context(_) | ResolutionError::PathTraversal { .. }
        )
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ResolutionError::Context(_) => "CONTEXT_ERROR",
            ResolutionError::IncompleteConfiguration { .. } => "INCOMPLETE_CONFIGURATION",
            ResolutionError::Io { .. } => "IO_ERROR",
            ResolutionError::PathTraversal { .. } => "PATH_TRAVERSAL",
        }
    }
}

/// Failures of the upstream entity store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Entity store {backend} unavailable: {reason}")]
    Unavailable { backend: String, reason: String },

    #[error("Corrupt {entity} record {id}: {reason}")]
    Corrupt {
        entity: String,
        id: String,
        reason: String,
    },
}
