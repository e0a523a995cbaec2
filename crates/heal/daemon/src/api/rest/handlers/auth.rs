//! Current-principal and onboarding handlers

use crate::api::rest::middleware::CurrentSession;
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use heal_identity::OnboardingRequest;
use heal_types::{Principal, Role};
use serde::Serialize;

/// `GET /api/auth/me` response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub is_authenticated: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<MeUser>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeUser {
    pub user_id: String,
    pub role: String,
    pub onboarding_complete: bool,
}

/// Current principal as the signed claims describe it
pub async fn current_principal(CurrentSession(session): CurrentSession) -> Response {
    let Some(claims) = session else {
        let body = MeResponse {
            is_authenticated: false,
            user: None,
        };
        return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    };

    // Unset roles read as patient, matching the profile mirror default
    let role = claims
        .role()
        .map(|r| r.as_str().to_string())
        .unwrap_or_else(|| Role::Patient.as_str().to_string());

    Json(MeResponse {
        is_authenticated: true,
        user: Some(MeUser {
            user_id: claims.sub.to_string(),
            role,
            onboarding_complete: claims.onboarding_complete(),
        }),
    })
    .into_response()
}

/// Onboarding response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingResponse {
    pub success: bool,
    pub message: String,

    /// Refreshed session carrying the new role
    pub session_token: String,
}

/// Apply a role selection for the signed-in principal
pub async fn submit_onboarding(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    payload: Result<Json<OnboardingRequest>, JsonRejection>,
) -> ApiResult<Json<OnboardingResponse>> {
    let claims = session.ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

    // An unreadable body carries no valid role
    let request = payload.map(|Json(r)| r).unwrap_or_default();

    // Sessions may predate this provider's view of the principal
    state
        .provider
        .register(Principal::new(claims.sub.clone()))
        .await
        .map_err(|e| {
            tracing::error!(principal_id = %claims.sub, error = %e, "Principal registration failed");
            ApiError::Internal("Failed to update profile data.".to_string())
        })?;

    let outcome = state.onboarding.submit(&claims.sub, &request).await?;

    tracing::info!(
        principal_id = %claims.sub,
        role = ?outcome.principal.role(),
        "Onboarding complete"
    );

    Ok(Json(OnboardingResponse {
        success: true,
        message: "Profile updated successfully.".to_string(),
        session_token: outcome.session_token,
    }))
}
