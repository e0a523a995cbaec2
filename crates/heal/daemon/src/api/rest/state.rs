//! Application state for API handlers

use crate::storage::ProfileStore;
use axum::http::{header, HeaderMap};
use heal_access::{EdgeGate, EdgePolicy, RouteTable};
use heal_identity::{
    AdminCode, IdentityProvider, OnboardingService, SessionVerifier, WebhookVerifier,
};
use heal_types::SessionClaims;
use std::sync::Arc;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "__session";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Route classification shared by both gates
    pub routes: Arc<RouteTable>,

    /// Edge gate
    pub edge: Arc<EdgeGate>,

    /// Session verification key material
    pub verifier: SessionVerifier,

    /// Identity provider handle
    pub provider: Arc<dyn IdentityProvider>,

    /// Onboarding submissions
    pub onboarding: OnboardingService,

    /// Webhook authentication, `None` when no secret is configured
    pub webhook: Option<WebhookVerifier>,

    /// Profile mirror
    pub profiles: Arc<dyn ProfileStore>,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Create new application state with the default route table
    pub fn new(provider: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        let routes = Arc::new(RouteTable::default());
        Self {
            edge: Arc::new(EdgeGate::new(routes.clone())),
            routes,
            verifier: provider.verifier(),
            onboarding: OnboardingService::new(provider.clone()),
            provider,
            webhook: None,
            profiles,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    pub fn with_edge_policy(mut self, policy: EdgePolicy) -> Self {
        self.edge = Arc::new(EdgeGate::new(self.routes.clone()).with_policy(policy));
        self
    }

    pub fn with_admin_code(mut self, code: AdminCode) -> Self {
        self.onboarding = self.onboarding.with_admin_code(code);
        self
    }

    pub fn with_webhook(mut self, verifier: WebhookVerifier) -> Self {
        self.webhook = Some(verifier);
        self
    }

    /// Verified claims from the request headers, if any
    pub fn verify_session(&self, headers: &HeaderMap) -> Option<SessionClaims> {
        let token = session_token(headers)?;
        match self.verifier.verify(token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid session token");
                None
            }
        }
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let duration = chrono::Utc::now() - self.started_at;
        let secs = duration.num_seconds();

        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else if secs < 86400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
        }
    }
}

/// Session token from `Authorization: Bearer` or the session cookie
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value)
}
