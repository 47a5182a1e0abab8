use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, RawPathParams, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use context::{ContextBuilder, TokenClaims};
use errors::ContextError;
use hr_core::EntityLookup;
use tracing::trace;

use crate::error::AccessError;
use crate::gate::AccessGate;
use crate::route::RouteRequirement;

/// State of one [`enforce_access`] layer: the shared gate plus the
/// requirement of the routes it wraps.
pub struct AccessLayer<L: EntityLookup> {
    pub gate: Arc<AccessGate<L>>,
    pub requirement: RouteRequirement,
}

impl<L: EntityLookup> AccessLayer<L> {
    pub fn new(gate: Arc<AccessGate<L>>, requirement: RouteRequirement) -> Self {
        Self { gate, requirement }
    }
}

impl<L: EntityLookup> Clone for AccessLayer<L> {
    fn clone(&self) -> Self {
        Self {
            gate: Arc::clone(&self.gate),
            requirement: self.requirement,
        }
    }
}

/// `axum` middleware around [`AccessGate::authorize`].
///
/// Mount with `route_layer` so path parameters are available:
///
/// ```rust,ignore
/// let layer = AccessLayer::new(gate, RouteRequirement::scope(SecurityScope::Tenant));
/// let app = Router::new()
///     .route("/tenants/{tenant_slug}/config", get(show_config))
///     .route_layer(middleware::from_fn_with_state(layer, enforce_access::<Directory>));
/// ```
///
/// On success the handler finds an [`crate::AccessGrant`] in the request
/// extensions; failures become a JSON error response.
pub async fn enforce_access<L>(
    State(layer): State<AccessLayer<L>>,
    request: Request,
    next: Next,
) -> Response
where
    L: EntityLookup + 'static,
{
    let path = request.uri().path().to_string();
    if layer.gate.is_public(&path) {
        trace!(path = %path, "Public route");
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();

    let Some(claims) = parts.extensions.get::<TokenClaims>().cloned() else {
        let error = AccessError::from(ContextError::MissingClaim {
            claim: "sub".to_string(),
        });
        return error.into_response();
    };

    let mut overrides = ContextBuilder::new().with_headers(
        parts
            .headers
            .iter()
            .filter(|(name, _)| name.as_str().starts_with("x-"))
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v))),
    );
    if let Ok(params) = RawPathParams::from_request_parts(&mut parts, &()).await {
        overrides = overrides.with_path_params(
            params
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string())),
        );
    }

    match layer
        .gate
        .authorize(&path, &claims, overrides, &layer.requirement)
        .await
    {
        Ok(grant) => {
            parts.extensions.insert(grant);
            next.run(Request::from_parts(parts, body)).await
        }
        Err(e) => e.into_response(),
    }
}
