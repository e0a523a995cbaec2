//! Identity provider collaborator

use crate::error::ProviderError;
use crate::session::{SessionIssuer, SessionVerifier};
use async_trait::async_trait;
use heal_types::{ClaimsMetadata, Principal, PrincipalId, PrincipalMetadata};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Result type alias for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Issues sessions and owns principal metadata
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Record a principal on first sign-in. Existing principals are kept.
    async fn register(&self, principal: Principal) -> ProviderResult<Principal>;

    /// Look up a principal
    async fn principal(&self, id: &PrincipalId) -> ProviderResult<Option<Principal>>;

    /// Replace a principal's public metadata
    async fn update_metadata(
        &self,
        id: &PrincipalId,
        metadata: PrincipalMetadata,
    ) -> ProviderResult<Principal>;

    /// Sign a session carrying the principal's current metadata
    async fn issue_session(&self, id: &PrincipalId) -> ProviderResult<String>;

    /// Read-only key material for verifying sessions
    fn verifier(&self) -> SessionVerifier;
}

/// In-memory identity provider
#[derive(Debug)]
pub struct LocalIdentityProvider {
    principals: RwLock<HashMap<PrincipalId, Principal>>,
    issuer: SessionIssuer,
}

impl LocalIdentityProvider {
    pub fn new(issuer: SessionIssuer) -> Self {
        Self {
            principals: RwLock::new(HashMap::new()),
            issuer,
        }
    }

    pub fn issuer(&self) -> &SessionIssuer {
        &self.issuer
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn register(&self, principal: Principal) -> ProviderResult<Principal> {
        let mut principals = self.principals.write().await;
        let stored = principals
            .entry(principal.id.clone())
            .or_insert(principal)
            .clone();
        Ok(stored)
    }

    async fn principal(&self, id: &PrincipalId) -> ProviderResult<Option<Principal>> {
        let principals = self.principals.read().await;
        Ok(principals.get(id).cloned())
    }

    async fn update_metadata(
        &self,
        id: &PrincipalId,
        metadata: PrincipalMetadata,
    ) -> ProviderResult<Principal> {
        let mut principals = self.principals.write().await;
        let principal = principals
            .get_mut(id)
            .ok_or_else(|| ProviderError::UnknownPrincipal(id.clone()))?;
        principal.metadata = metadata;

        tracing::info!(principal_id = %id, role = ?principal.metadata.role, "Updated principal metadata");
        Ok(principal.clone())
    }

    async fn issue_session(&self, id: &PrincipalId) -> ProviderResult<String> {
        let metadata = {
            let principals = self.principals.read().await;
            let principal = principals
                .get(id)
                .ok_or_else(|| ProviderError::UnknownPrincipal(id.clone()))?;
            ClaimsMetadata::from(&principal.metadata)
        };
        Ok(self.issuer.issue(id.clone(), metadata)?)
    }

    fn verifier(&self) -> SessionVerifier {
        self.issuer.verifier()
    }
}
