//! Edge gate middleware and the session extractor

use super::state::AppState;
use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use heal_access::routes::LOGIN_PATH;
use heal_access::{AccessDecision, EdgeMatcher};
use heal_types::SessionClaims;
use std::convert::Infallible;

/// Verified session attached to a request. `None` means no valid session.
#[derive(Debug, Clone, Default)]
pub struct CurrentSession(pub Option<SessionClaims>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<CurrentSession>() {
            return Ok(session.clone());
        }
        // Paths the edge matcher skips carry no verified session yet
        Ok(Self(state.verify_session(&parts.headers)))
    }
}

/// Run the edge gate before any handler
pub async fn edge_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if !EdgeMatcher.applies(&path) {
        return next.run(request).await;
    }

    let claims = state.verify_session(request.headers());
    let evaluation = state.edge.evaluate(&path, claims.as_ref());

    match &evaluation.decision {
        AccessDecision::Allow => {
            tracing::debug!(path = %path, rule = evaluation.rule, "Edge allowed request");
            request.extensions_mut().insert(CurrentSession(claims));
            next.run(request).await
        }
        AccessDecision::RedirectToLogin if path.starts_with("/api") => {
            tracing::info!(path = %path, rule = evaluation.rule, "Edge challenged API request");
            ApiError::Unauthorized("Authentication required".to_string()).into_response()
        }
        decision => {
            let target = decision.target().unwrap_or(LOGIN_PATH);
            tracing::info!(
                path = %path,
                redirect_to = target,
                rule = evaluation.rule,
                denial = ?evaluation.denial,
                "Edge redirected request"
            );
            Redirect::temporary(target).into_response()
        }
    }
}
