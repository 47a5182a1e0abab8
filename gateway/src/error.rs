use authz::AuthorizationResult;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use errors::{ContextError, ResolutionError};
use hr_core::AccessScope;
use serde_json::json;
use thiserror::Error;

/// Why a request was stopped by the access middleware.
#[derive(Error, Debug)]
pub enum AccessError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("Access scope {actual} does not cover required scope {required}")]
    InsufficientScope {
        required: AccessScope,
        actual: AccessScope,
    },

    #[error("Access denied: {}", .0.reason)]
    Denied(Box<AuthorizationResult>),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

impl AccessError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AccessError::Context(_)
            | AccessError::InsufficientScope { .. }
            | AccessError::Denied(_) => StatusCode::FORBIDDEN,
            AccessError::Resolution(e) if e.is_client_error() => StatusCode::FORBIDDEN,
            AccessError::Resolution(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AccessError::Context(ContextError::TokenRevoked { .. }) => "TOKEN_REVOKED",
            AccessError::Context(ContextError::OverrideNotPermitted { .. }) => {
                "OVERRIDE_NOT_PERMITTED"
            }
            AccessError::Context(_) => "INVALID_CONTEXT",
            AccessError::InsufficientScope { .. } => "INSUFFICIENT_SCOPE",
            AccessError::Denied(_) => "ACCESS_DENIED",
            AccessError::Resolution(e) => e.code(),
        }
    }
}

impl From<AuthorizationResult> for AccessError {
    fn from(result: AuthorizationResult) -> Self {
        AccessError::Denied(Box::new(result))
    }
}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut error = json!({
            "code": self.error_code(),
            "message": self.to_string(),
        });

        match &self {
            AccessError::Denied(result) => {
                error["reason"] = json!(result.reason);
                error["permissionLevel"] = json!(result.permission_level.value());
                error["requiredLevel"] = json!(result.required_level.value());
            }
            AccessError::InsufficientScope { required, actual } => {
                error["requiredScope"] = json!(required.to_string());
                error["accessLevel"] = json!(actual.to_string());
            }
            _ => {}
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
