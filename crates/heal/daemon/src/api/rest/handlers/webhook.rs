//! Identity provider webhook relay

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use heal_identity::WebhookHeaders;
use serde::Serialize;

/// Webhook acknowledgement
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub success: bool,
}

/// `svix-*` header, or its unbranded `webhook-*` twin
fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    [format!("svix-{}", name), format!("webhook-{}", name)]
        .iter()
        .find_map(|key| headers.get(key.as_str()))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Verify a delivery and mirror user events into the profile store
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let Some(verifier) = state.webhook.as_ref() else {
        tracing::error!("Webhook received but no webhook secret is configured");
        return Err(ApiError::Internal("Webhook secret not configured".to_string()));
    };

    let headers = WebhookHeaders {
        id: header(&headers, "id"),
        timestamp: header(&headers, "timestamp"),
        signature: header(&headers, "signature"),
    };

    let event = verifier.verify(&headers, &body).map_err(|e| {
        tracing::warn!(error = %e, "Rejected webhook delivery");
        ApiError::from(e)
    })?;

    let Some(user) = event.user()? else {
        tracing::debug!(event_type = %event.event_type, "Ignoring webhook event");
        return Ok(Json(WebhookAck { success: true }));
    };

    let profile = user.to_profile(chrono::Utc::now());
    tracing::info!(
        principal_id = %profile.identity_id,
        role = %profile.role,
        event_type = %event.event_type,
        "Syncing user profile"
    );

    // A storage failure surfaces as 500 so the sender retries
    state.profiles.upsert_profile(profile).await.map_err(|e| {
        tracing::error!(error = %e, "Profile sync failed");
        ApiError::from(e)
    })?;

    Ok(Json(WebhookAck { success: true }))
}
