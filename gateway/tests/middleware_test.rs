use std::sync::Arc;

use authz::PermissionEvaluator;
use axum::{
    Extension, Json, Router,
    body::Body,
    extract::Request,
    http::{Request as HttpRequest, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use context::TokenClaims;
use gateway::{
    AccessGate, AccessGrant, AccessLayer, RouteRequirement, SecurityScope, enforce_access,
};
use hr_core::{Action, Resource};
use observability::{AuditKind, MemoryAuditSink};
use resolver::ConfigResolver;
use serde_json::{Value, json};
use testing::{FragmentTree, InMemoryDirectory};
use tower::ServiceExt;

const CLAIMS_HEADER: &str = "x-test-claims";

/// Stands in for the upstream token layer.
async fn inject_claims(mut request: Request, next: Next) -> Response {
    let claims = request
        .headers()
        .get(CLAIMS_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| serde_json::from_str::<TokenClaims>(raw).ok());
    if let Some(claims) = claims {
        request.extensions_mut().insert(claims);
    }
    next.run(request).await
}

async fn show_grant(Extension(grant): Extension<AccessGrant>) -> Json<Value> {
    Json(json!({
        "config": grant.config.values,
        "accessLevel": grant.access_level.to_string(),
        "securityScope": grant.security_scope.to_string(),
        "user": grant.auth_context.user_id.as_str(),
        "decided": grant.decision.is_some(),
    }))
}

struct Harness {
    _tree: FragmentTree,
    gate: Arc<AccessGate<InMemoryDirectory>>,
    audit: Arc<MemoryAuditSink>,
}

fn harness() -> Harness {
    let tree = FragmentTree::with_required_keys("acme", "sales").unwrap();
    tree.platform("10-ui.env", "UI_THEME=light\nDATABASE_URL=postgres://db")
        .unwrap();
    tree.organization(
        "acme",
        "sales",
        "10-ui.env",
        "UI_THEME=dark\nAI_OPENAI_API_KEY=sk-live-123456789",
    )
    .unwrap();
    tree.tenant("acme", "20-mail.env", "SMTP_PASSWORD=acme-mail-pass")
        .unwrap();
    tree.tenant("globex", "00-base.env", "TENANT_ID=t2").unwrap();
    tree.tenant(
        "globex",
        "20-secret.env",
        "SMTP_PASSWORD=globex-mail-pass\nBILLING_PLAN=gold\nTENANT_SECRET_KEY=globex-secret",
    )
    .unwrap();

    let audit = Arc::new(MemoryAuditSink::new());
    let gate = AccessGate::new(
        Arc::new(ConfigResolver::new(tree.root()).with_audit_sink(audit.clone())),
        Arc::new(PermissionEvaluator::new(InMemoryDirectory::new()).with_audit_sink(audit.clone())),
    )
    .with_public_paths(vec!["/health".to_string()])
    .with_audit_sink(audit.clone());

    Harness {
        _tree: tree,
        gate: Arc::new(gate),
        audit,
    }
}

fn app(gate: &Arc<AccessGate<InMemoryDirectory>>) -> Router {
    let layer = |requirement| {
        middleware::from_fn_with_state(
            AccessLayer::new(Arc::clone(gate), requirement),
            enforce_access::<InMemoryDirectory>,
        )
    };

    let user_routes = Router::new()
        .route("/health", get(|| async { "healthy" }))
        .route("/config", get(show_grant))
        .route_layer(layer(RouteRequirement::default()));
    let tenant_routes = Router::new()
        .route("/tenants/{tenant_slug}/config", get(show_grant))
        .route_layer(layer(RouteRequirement::scope(SecurityScope::Tenant)));
    let audit_routes = Router::new()
        .route("/audit", get(show_grant))
        .route_layer(layer(
            RouteRequirement::default().with_permission(Resource::AuditLog, Action::Read),
        ));

    Router::new()
        .merge(user_routes)
        .merge(tenant_routes)
        .merge(audit_routes)
        .layer(middleware::from_fn(inject_claims))
}

fn member_claims(id: &str, role: &str) -> TokenClaims {
    TokenClaims::new(id, role)
        .with_tenant("t1", "acme")
        .with_organization("o1", "sales")
}

fn request(uri: &str, claims: Option<&TokenClaims>) -> HttpRequest<Body> {
    let mut builder = HttpRequest::builder().uri(uri);
    if let Some(claims) = claims {
        builder = builder.header(CLAIMS_HEADER, serde_json::to_string(claims).unwrap());
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_public_route_skips_checks() {
    let h = harness();
    let response = app(&h.gate)
        .oneshot(request("/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(h.audit.is_empty());
}

#[tokio::test]
async fn test_missing_identity_is_forbidden() {
    let h = harness();
    let response = app(&h.gate)
        .oneshot(request("/config", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_CONTEXT");
}

#[tokio::test]
async fn test_employee_receives_redacted_configuration() {
    let h = harness();
    let claims = member_claims("e1", "employee");
    let response = app(&h.gate)
        .oneshot(request("/config", Some(&claims)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["config"]["UI_THEME"], "dark");
    assert!(body["config"].get("AI_OPENAI_API_KEY").is_none());
    assert!(body["config"].get("DATABASE_URL").is_none());
    assert_eq!(body["accessLevel"], "user");
    assert_eq!(body["securityScope"], "user");
    assert_eq!(body["decided"], false);

    let routes: Vec<_> = h
        .audit
        .records()
        .into_iter()
        .filter(|r| r.kind == AuditKind::RouteAccess)
        .collect();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].authorized, Some(true));
    assert_eq!(routes[0].target.as_deref(), Some("/config"));
    assert_eq!(routes[0].tenant_slug.as_deref(), Some("acme"));
}

#[tokio::test]
async fn test_scope_mismatch_is_rejected() {
    let h = harness();
    let claims = member_claims("e1", "employee");
    let response = app(&h.gate)
        .oneshot(request("/tenants/acme/config", Some(&claims)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INSUFFICIENT_SCOPE");
    assert_eq!(body["error"]["requiredScope"], "tenant");
    assert_eq!(body["error"]["accessLevel"], "user");
    assert_eq!(h.audit.last().unwrap().authorized, Some(false));
}

#[tokio::test]
async fn test_tenant_admin_reads_own_tenant_secrets() {
    let h = harness();
    let claims = TokenClaims::new("a1", "admin").with_tenant("t1", "acme");
    let response = app(&h.gate)
        .oneshot(request("/tenants/acme/config", Some(&claims)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["config"]["TENANT_ID"], "acme");
    assert_eq!(body["config"]["SMTP_PASSWORD"], "acme-mail-pass");
    assert_eq!(body["accessLevel"], "tenant");
}

#[tokio::test]
async fn test_tenant_admin_cannot_reach_another_tenant() {
    let h = harness();
    let claims = TokenClaims::new("a1", "admin").with_tenant("t1", "acme");

    let response = app(&h.gate)
        .oneshot(request("/tenants/globex/config", Some(&claims)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "OVERRIDE_NOT_PERMITTED");

    let response = app(&h.gate)
        .oneshot(
            HttpRequest::builder()
                .uri("/config")
                .header(CLAIMS_HEADER, serde_json::to_string(&claims).unwrap())
                .header("x-tenant-slug", "globex")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let raw = body_json(response).await.to_string();
    assert!(!raw.contains("globex-mail-pass"));
    assert!(!raw.contains("globex-secret"));
    assert_eq!(h.audit.last().unwrap().authorized, Some(false));
}

#[tokio::test]
async fn test_platform_admin_addresses_any_tenant_through_path() {
    let h = harness();
    let claims = TokenClaims::new("root", "admin");
    let response = app(&h.gate)
        .oneshot(request("/tenants/globex/config", Some(&claims)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["config"]["TENANT_ID"], "t2");
    assert_eq!(body["config"]["TENANT_SECRET_KEY"], "globex-secret");
    assert_eq!(body["accessLevel"], "tenant");
}

#[tokio::test]
async fn test_permission_denial_echoes_levels() {
    let h = harness();
    let claims = member_claims("e1", "employee");
    let response = app(&h.gate)
        .oneshot(request("/audit", Some(&claims)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "ACCESS_DENIED");
    assert_eq!(body["error"]["permissionLevel"], 0);
    assert_eq!(body["error"]["requiredLevel"], 3);
    assert!(
        body["error"]["reason"]
            .as_str()
            .unwrap()
            .starts_with("Insufficient permission level")
    );
}

#[tokio::test]
async fn test_permission_grant_reaches_handler() {
    let h = harness();
    let claims = member_claims("h1", "hr");
    let response = app(&h.gate)
        .oneshot(request("/audit", Some(&claims)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["decided"], true);
    assert_eq!(body["user"], "h1");
}

#[tokio::test]
async fn test_revoked_token_is_rejected() {
    let h = harness();
    let claims = member_claims("e1", "employee").with_jti("jti-9", i64::MAX);
    h.gate.blacklist().revoke("jti-9", i64::MAX);

    let response = app(&h.gate)
        .oneshot(request("/config", Some(&claims)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "TOKEN_REVOKED");
}

#[tokio::test]
async fn test_incomplete_configuration_is_server_error() {
    let h = harness();
    let claims = TokenClaims::new("root", "admin");
    let response = app(&h.gate)
        .oneshot(request("/tenants/initech/config", Some(&claims)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INCOMPLETE_CONFIGURATION");
}

#[tokio::test]
async fn test_invalid_slug_header_is_rejected() {
    let h = harness();
    let claims = TokenClaims::new("root", "admin");
    let response = app(&h.gate)
        .oneshot(
            HttpRequest::builder()
                .uri("/config")
                .header(CLAIMS_HEADER, serde_json::to_string(&claims).unwrap())
                .header("x-tenant-slug", "..")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_CONTEXT");
}

#[test]
fn test_public_path_matching() {
    let h = harness();
    assert!(h.gate.is_public("/health"));
    assert!(h.gate.is_public("/health/live"));
    assert!(!h.gate.is_public("/healthz"));
    assert!(!h.gate.is_public("/config"));
}
