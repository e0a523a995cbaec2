//! Onboarding submission
//!
//! A principal picks a role once; later submissions are refused. Admin requires the configured
//! authorization code; without one configured, admin onboarding is closed.

use crate::error::{OnboardingError, ProviderError};
use crate::provider::IdentityProvider;
use heal_types::{Principal, PrincipalId, PrincipalMetadata, Role};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of an onboarding submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRequest {
    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub admin_code: Option<String>,
}

impl OnboardingRequest {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
            admin_code: None,
        }
    }

    pub fn with_admin_code(mut self, code: impl Into<String>) -> Self {
        self.admin_code = Some(code.into());
        self
    }
}

/// Result of a successful onboarding
#[derive(Debug, Clone)]
pub struct OnboardingOutcome {
    pub principal: Principal,

    /// Freshly issued session carrying the new role. Callers must replace
    /// their local session with it.
    pub session_token: String,
}

/// Admin authorization code, held as a BLAKE3 digest
#[derive(Clone)]
pub struct AdminCode(blake3::Hash);

impl AdminCode {
    pub fn new(code: &str) -> Self {
        Self(blake3::hash(code.as_bytes()))
    }

    /// `blake3::Hash` equality is constant-time
    pub fn matches(&self, candidate: &str) -> bool {
        blake3::hash(candidate.as_bytes()) == self.0
    }
}

impl std::fmt::Debug for AdminCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminCode(<redacted>)")
    }
}

/// Applies onboarding submissions through the identity provider
#[derive(Clone)]
pub struct OnboardingService {
    provider: Arc<dyn IdentityProvider>,
    admin_code: Option<AdminCode>,
}

impl OnboardingService {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            admin_code: None,
        }
    }

    pub fn with_admin_code(mut self, code: AdminCode) -> Self {
        self.admin_code = Some(code);
        self
    }

    /// Validate the request, durably set role and onboarding flag, and
    /// return a refreshed session. On any error the stored metadata is
    /// left untouched.
    pub async fn submit(
        &self,
        principal: &PrincipalId,
        request: &OnboardingRequest,
    ) -> Result<OnboardingOutcome, OnboardingError> {
        let role: Role = request
            .role
            .as_deref()
            .and_then(|raw| raw.parse().ok())
            .ok_or(OnboardingError::InvalidRole)?;

        tracing::info!(principal_id = %principal, role = %role, "Onboarding submission");

        let current = self
            .provider
            .principal(principal)
            .await?
            .ok_or_else(|| ProviderError::UnknownPrincipal(principal.clone()))?;
        if current.is_onboarded() {
            tracing::warn!(
                principal_id = %principal,
                current_role = ?current.metadata.role,
                requested_role = %role,
                "Rejected repeat onboarding"
            );
            return Err(OnboardingError::AlreadyOnboarded);
        }

        if role == Role::Admin {
            let authorized = match (&self.admin_code, request.admin_code.as_deref()) {
                (Some(expected), Some(candidate)) => expected.matches(candidate),
                _ => false,
            };
            if !authorized {
                tracing::warn!(principal_id = %principal, "Rejected admin onboarding: bad authorization code");
                return Err(OnboardingError::AdminCodeInvalid);
            }
        }

        let updated = self
            .provider
            .update_metadata(principal, PrincipalMetadata::onboarded(role))
            .await
            .map_err(|e| {
                tracing::error!(principal_id = %principal, error = %e, "Onboarding metadata update failed");
                e
            })?;
        let session_token = self.provider.issue_session(principal).await?;

        Ok(OnboardingOutcome {
            principal: updated,
            session_token,
        })
    }
}
