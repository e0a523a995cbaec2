//! Profile mirror handlers

use crate::api::rest::middleware::CurrentSession;
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Path, State},
    Json,
};
use heal_types::{PrincipalId, Role, UserProfile};

/// Read a profile. Principals may read their own; admins may read any.
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    let claims = session.ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;

    let id = PrincipalId::new(id);
    if claims.sub != id && claims.known_role() != Some(Role::Admin) {
        tracing::info!(principal_id = %claims.sub, requested = %id, "Denied profile read");
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    state
        .profiles
        .get_profile(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Profile {}", id)))
}
