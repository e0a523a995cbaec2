//! HTTP surface tests: edge gate, auth endpoints, webhook relay, profiles

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use heal_access::EdgePolicy;
use heal_daemon::{create_router, AppState, InMemoryProfileStore, ProfileStore};
use heal_identity::{
    AdminCode, IdentityProvider, LocalIdentityProvider, SessionIssuer, WebhookVerifier,
};
use heal_types::{Principal, PrincipalId, PrincipalMetadata, Role};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN_CODE: &str = "HEALADMIN2024";
const WEBHOOK_SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";
const OTHER_WEBHOOK_SECRET: &str = "whsec_c2lnbmVkIGJ5IHNvbWVvbmUgZWxzZQ==";

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    provider: Arc<LocalIdentityProvider>,
    profiles: Arc<InMemoryProfileStore>,
    state: AppState,
}

impl Harness {
    fn new() -> Self {
        let provider = Arc::new(LocalIdentityProvider::new(SessionIssuer::from_seed(&[42u8; 32])));
        let profiles = Arc::new(InMemoryProfileStore::new());
        let state = AppState::new(provider.clone(), profiles.clone())
            .with_admin_code(AdminCode::new(ADMIN_CODE))
            .with_webhook(WebhookVerifier::new(WEBHOOK_SECRET).unwrap());
        Self {
            provider,
            profiles,
            state,
        }
    }

    fn strict(mut self) -> Self {
        self.state = self.state.with_edge_policy(EdgePolicy::strict());
        self
    }

    fn app(&self) -> Router {
        create_router(self.state.clone())
    }

    async fn session(&self, id: &str, metadata: PrincipalMetadata) -> String {
        let id = PrincipalId::new(id);
        self.provider
            .register(Principal::new(id.clone()).with_metadata(metadata))
            .await
            .unwrap();
        self.provider.issue_session(&id).await.unwrap()
    }
}

struct Reply {
    status: StatusCode,
    location: Option<String>,
    body: Value,
}

async fn send(app: Router, request: Request<Body>) -> Reply {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    Reply {
        status,
        location,
        body,
    }
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn signed_webhook(secret: &str, body: &Value) -> Request<Body> {
    let timestamp = chrono::Utc::now().timestamp().to_string();
    signed_webhook_at(secret, &timestamp, body)
}

fn signed_webhook_at(secret: &str, timestamp: &str, body: &Value) -> Request<Body> {
    let payload = body.to_string();
    let signature = WebhookVerifier::new(secret)
        .unwrap()
        .sign("msg_1", timestamp, payload.as_bytes());
    Request::builder()
        .method("POST")
        .uri("/api/auth/webhook/clerk")
        .header(header::CONTENT_TYPE, "application/json")
        .header("svix-id", "msg_1")
        .header("svix-timestamp", timestamp)
        .header("svix-signature", signature)
        .body(Body::from(payload))
        .unwrap()
}

fn user_event(event_type: &str, id: &str, role: Option<&str>) -> Value {
    json!({
        "type": event_type,
        "data": {
            "id": id,
            "email_addresses": [{ "email_address": format!("{}@example.com", id) }],
            "first_name": "Grace",
            "last_name": "Hopper",
            "public_metadata": { "role": role }
        }
    })
}

// ============================================================================
// Edge gate
// ============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let harness = Harness::new();
    let reply = send(harness.app(), get("/api/health", None)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "healthy");
}

#[tokio::test]
async fn test_protected_page_without_session_redirects_to_login() {
    let harness = Harness::new();
    for path in ["/patient/dashboard", "/doctor/appointments", "/admin", "/monitoring"] {
        let reply = send(harness.app(), get(path, None)).await;
        assert_eq!(reply.status, StatusCode::TEMPORARY_REDIRECT, "{}", path);
        assert_eq!(reply.location.as_deref(), Some("/login"), "{}", path);
    }
}

#[tokio::test]
async fn test_invalid_token_counts_as_no_session() {
    let harness = Harness::new();
    let forged = LocalIdentityProvider::new(SessionIssuer::from_seed(&[7u8; 32]));
    let id = PrincipalId::new("user_forged");
    forged
        .register(Principal::new(id.clone()).with_metadata(PrincipalMetadata::onboarded(Role::Admin)))
        .await
        .unwrap();
    let token = forged.issue_session(&id).await.unwrap();

    let reply = send(harness.app(), get("/admin/users", Some(&token))).await;
    assert_eq!(reply.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(reply.location.as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_unonboarded_session_is_sent_to_onboarding() {
    let harness = Harness::new();
    let token = harness.session("user_new", PrincipalMetadata::default()).await;

    let reply = send(harness.app(), get("/patient/dashboard", Some(&token))).await;
    assert_eq!(reply.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(reply.location.as_deref(), Some("/onboarding"));

    // The onboarding page itself is reachable
    let reply = send(harness.app(), get("/onboarding", Some(&token))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["clientAction"]["decision"]["action"], "allow");
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let harness = Harness::new();
    let token = harness
        .session("user_cookie", PrincipalMetadata::onboarded(Role::Patient))
        .await;

    let request = Request::builder()
        .uri("/patient/dashboard")
        .header(header::COOKIE, format!("theme=dark; __session={}", token))
        .body(Body::empty())
        .unwrap();
    let reply = send(harness.app(), request).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["classification"]["class"], "protected");
    assert_eq!(reply.body["classification"]["role"], "patient");
}

#[tokio::test]
async fn test_cross_role_page_defers_to_client_gate_by_default() {
    let harness = Harness::new();
    let token = harness
        .session("user_doc", PrincipalMetadata::onboarded(Role::Doctor))
        .await;

    let reply = send(harness.app(), get("/admin/users", Some(&token))).await;
    assert_eq!(reply.status, StatusCode::OK);
    let action = &reply.body["clientAction"];
    assert_eq!(action["decision"]["action"], "redirect_to_own_dashboard");
    assert_eq!(action["decision"]["target"], "/doctor/dashboard");
    assert_eq!(action["denial"], "role_mismatch");
}

#[tokio::test]
async fn test_strict_edge_enforces_role_scope() {
    let harness = Harness::new().strict();
    let token = harness
        .session("user_doc", PrincipalMetadata::onboarded(Role::Doctor))
        .await;

    let reply = send(harness.app(), get("/admin/users", Some(&token))).await;
    assert_eq!(reply.status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(reply.location.as_deref(), Some("/doctor/dashboard"));

    let reply = send(harness.app(), get("/doctor/dashboard", Some(&token))).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn test_signed_in_landing_redirect_is_advisory() {
    let harness = Harness::new();
    let token = harness
        .session("user_pat", PrincipalMetadata::onboarded(Role::Patient))
        .await;

    let reply = send(harness.app(), get("/login", Some(&token))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.body["clientAction"]["decision"]["target"],
        "/patient/dashboard"
    );

    let reply = send(harness.app(), get("/contact", None)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["classification"]["class"], "public");
    assert_eq!(reply.body["clientAction"]["rule"], "public-page");
}

#[tokio::test]
async fn test_static_assets_skip_the_edge() {
    let harness = Harness::new();
    let reply = send(harness.app(), get("/patient/avatar.png", None)).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_api_path_is_not_found() {
    let harness = Harness::new();
    let reply = send(harness.app(), get("/api/nope", None)).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["code"], "NOT_FOUND");
}

// ============================================================================
// Current principal
// ============================================================================

#[tokio::test]
async fn test_me_without_session() {
    let harness = Harness::new();
    let reply = send(harness.app(), get("/api/auth/me", None)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body, json!({ "isAuthenticated": false }));
}

#[tokio::test]
async fn test_me_defaults_role_to_patient() {
    let harness = Harness::new();
    let token = harness.session("user_me", PrincipalMetadata::default()).await;

    let reply = send(harness.app(), get("/api/auth/me", Some(&token))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["isAuthenticated"], true);
    assert_eq!(reply.body["user"]["userId"], "user_me");
    assert_eq!(reply.body["user"]["role"], "patient");
    assert_eq!(reply.body["user"]["onboardingComplete"], false);
}

// ============================================================================
// Onboarding
// ============================================================================

#[tokio::test]
async fn test_onboarding_requires_session() {
    let harness = Harness::new();
    let reply = send(
        harness.app(),
        post_json("/api/auth/onboarding", None, json!({ "role": "patient" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_onboarding_rejects_invalid_role() {
    let harness = Harness::new();
    let token = harness.session("user_x", PrincipalMetadata::default()).await;

    for body in [json!({ "role": "nurse" }), json!({}), json!("garbage")] {
        let reply = send(
            harness.app(),
            post_json("/api/auth/onboarding", Some(&token), body),
        )
        .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body["error"], "Invalid role selected.");
    }
}

#[tokio::test]
async fn test_admin_onboarding_with_bad_code_leaves_role_unchanged() {
    let harness = Harness::new();
    let token = harness.session("user_adm", PrincipalMetadata::default()).await;

    let reply = send(
        harness.app(),
        post_json(
            "/api/auth/onboarding",
            Some(&token),
            json!({ "role": "admin", "adminCode": "guess" }),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["error"], "Invalid admin authorization code.");

    let stored = harness
        .provider
        .principal(&PrincipalId::new("user_adm"))
        .await
        .unwrap()
        .unwrap();
    assert!(stored.role().is_none());
    assert!(!stored.is_onboarded());

    let reply = send(
        harness.app(),
        post_json(
            "/api/auth/onboarding",
            Some(&token),
            json!({ "role": "admin", "adminCode": ADMIN_CODE }),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn test_onboarding_refreshes_session() {
    let harness = Harness::new();
    let token = harness.session("user_onb", PrincipalMetadata::default()).await;

    let reply = send(
        harness.app(),
        post_json("/api/auth/onboarding", Some(&token), json!({ "role": "patient" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["success"], true);
    assert_eq!(reply.body["message"], "Profile updated successfully.");

    let refreshed = reply.body["sessionToken"].as_str().unwrap().to_string();
    let claims = harness.state.verifier.verify(&refreshed).unwrap();
    assert_eq!(claims.known_role(), Some(Role::Patient));
    assert!(claims.onboarding_complete());

    // The stale session still lacks the flag; the refreshed one passes
    let reply = send(harness.app(), get("/patient/dashboard", Some(&token))).await;
    assert_eq!(reply.location.as_deref(), Some("/onboarding"));
    let reply = send(harness.app(), get("/patient/dashboard", Some(&refreshed))).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn test_onboarding_twice_is_conflict() {
    let harness = Harness::new();
    let token = harness.session("user_twice", PrincipalMetadata::default()).await;

    let reply = send(
        harness.app(),
        post_json("/api/auth/onboarding", Some(&token), json!({ "role": "patient" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);

    // Replaying the original session does not reopen role selection
    let reply = send(
        harness.app(),
        post_json("/api/auth/onboarding", Some(&token), json!({ "role": "doctor" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["code"], "CONFLICT");
    assert_eq!(reply.body["error"], "Onboarding already completed.");

    let stored = harness
        .provider
        .principal(&PrincipalId::new("user_twice"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.role(), Some(Role::Patient));
}

#[tokio::test]
async fn test_onboarding_registers_unknown_session_principal() {
    let harness = Harness::new();
    let issuer = SessionIssuer::from_seed(&[42u8; 32]);
    let token = issuer
        .issue(PrincipalId::new("user_external"), Default::default())
        .unwrap();

    let reply = send(
        harness.app(),
        post_json("/api/auth/onboarding", Some(&token), json!({ "role": "doctor" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
}

// ============================================================================
// Webhook relay and profiles
// ============================================================================

#[tokio::test]
async fn test_webhook_is_exempt_from_session_checks() {
    let harness = Harness::new();
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/webhook/clerk")
        .body(Body::from("{}"))
        .unwrap();

    // Missing signature headers: rejected by the relay, not redirected
    let reply = send(harness.app(), request).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.location.is_none());
}

#[tokio::test]
async fn test_webhook_bad_signature_rejected() {
    let harness = Harness::new();
    let reply = send(
        harness.app(),
        signed_webhook(OTHER_WEBHOOK_SECRET, &user_event("user.created", "user_w", None)),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(harness.profiles.count_profiles().await.unwrap(), 0);
}

#[tokio::test]
async fn test_webhook_extreme_timestamp_rejected() {
    let harness = Harness::new();
    for timestamp in ["-9223372036854775808", "9223372036854775807", "not-a-number"] {
        let reply = send(
            harness.app(),
            signed_webhook_at(
                WEBHOOK_SECRET,
                timestamp,
                &user_event("user.created", "user_w", None),
            ),
        )
        .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    }
    assert_eq!(harness.profiles.count_profiles().await.unwrap(), 0);
}

#[tokio::test]
async fn test_webhook_accepts_unbranded_headers() {
    let harness = Harness::new();
    let payload = user_event("user.created", "user_plain", None).to_string();
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let signature = WebhookVerifier::new(WEBHOOK_SECRET)
        .unwrap()
        .sign("msg_2", &timestamp, payload.as_bytes());
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/webhook/clerk")
        .header(header::CONTENT_TYPE, "application/json")
        .header("webhook-id", "msg_2")
        .header("webhook-timestamp", timestamp)
        .header("webhook-signature", signature)
        .body(Body::from(payload))
        .unwrap();

    let reply = send(harness.app(), request).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(harness.profiles.count_profiles().await.unwrap(), 1);
}

#[tokio::test]
async fn test_webhook_without_configured_secret_is_server_error() {
    let provider = Arc::new(LocalIdentityProvider::new(SessionIssuer::from_seed(&[1u8; 32])));
    let state = AppState::new(provider, Arc::new(InMemoryProfileStore::new()));
    let reply = send(
        create_router(state),
        signed_webhook(WEBHOOK_SECRET, &user_event("user.created", "user_w", None)),
    )
    .await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_webhook_syncs_profile_and_keeps_created_at() {
    let harness = Harness::new();
    let id = PrincipalId::new("user_sync");

    let reply = send(
        harness.app(),
        signed_webhook(WEBHOOK_SECRET, &user_event("user.created", "user_sync", None)),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    let created = harness.profiles.get_profile(&id).await.unwrap().unwrap();
    assert_eq!(created.full_name, "Grace Hopper");
    assert_eq!(created.role, "patient");
    assert_eq!(created.email, "user_sync@example.com");

    let reply = send(
        harness.app(),
        signed_webhook(
            WEBHOOK_SECRET,
            &user_event("user.updated", "user_sync", Some("doctor")),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    let updated = harness.profiles.get_profile(&id).await.unwrap().unwrap();
    assert_eq!(updated.role, "doctor");
    assert_eq!(updated.created_at, created.created_at);
}

#[tokio::test]
async fn test_webhook_ignores_other_events() {
    let harness = Harness::new();
    let reply = send(
        harness.app(),
        signed_webhook(
            WEBHOOK_SECRET,
            &json!({ "type": "session.created", "data": { "id": "sess_1" } }),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(harness.profiles.count_profiles().await.unwrap(), 0);
}

#[tokio::test]
async fn test_profile_read_scope() {
    let harness = Harness::new();
    send(
        harness.app(),
        signed_webhook(WEBHOOK_SECRET, &user_event("user.created", "user_owner", None)),
    )
    .await;

    let owner = harness
        .session("user_owner", PrincipalMetadata::onboarded(Role::Patient))
        .await;
    let other = harness
        .session("user_other", PrincipalMetadata::onboarded(Role::Patient))
        .await;
    let admin = harness
        .session("user_admin", PrincipalMetadata::onboarded(Role::Admin))
        .await;

    let reply = send(harness.app(), get("/api/profiles/user_owner", None)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = send(harness.app(), get("/api/profiles/user_owner", Some(&owner))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["identityId"], "user_owner");

    let reply = send(harness.app(), get("/api/profiles/user_owner", Some(&other))).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = send(harness.app(), get("/api/profiles/user_owner", Some(&admin))).await;
    assert_eq!(reply.status, StatusCode::OK);

    let reply = send(harness.app(), get("/api/profiles/user_ghost", Some(&admin))).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}
