//! Page fallback
//!
//! Every non-API path that passed the edge lands here. The envelope carries
//! the client gate's advisory decision so a thin client shim can act on it.

use crate::api::rest::middleware::CurrentSession;
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{extract::State, http::Uri, Json};
use heal_access::{client, AccessEvaluation, ClientIdentity, RouteClass};
use serde::Serialize;

/// Page envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope {
    pub path: String,
    pub classification: RouteClass,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<ClientIdentity>,

    pub client_action: AccessEvaluation,
}

pub async fn render_page(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    uri: Uri,
) -> ApiResult<Json<PageEnvelope>> {
    let path = uri.path().to_string();
    if path.starts_with("/api") {
        return Err(ApiError::NotFound(path));
    }

    let identity = session.as_ref().map(ClientIdentity::from);
    let client_action = client::decide(&state.routes, identity.as_ref(), &path);

    Ok(Json(PageEnvelope {
        classification: state.routes.classify(&path),
        principal: identity,
        client_action,
        path,
    }))
}
