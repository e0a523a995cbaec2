//! In-memory storage implementation

use super::traits::*;
use async_trait::async_trait;
use heal_types::{PrincipalId, UserProfile};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory profile store for development and testing
#[derive(Debug, Default, Clone)]
pub struct InMemoryProfileStore {
    profiles: Arc<RwLock<HashMap<PrincipalId, UserProfile>>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile(&self, id: &PrincipalId) -> StorageResult<Option<UserProfile>> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(id).cloned())
    }

    async fn upsert_profile(&self, profile: UserProfile) -> StorageResult<UserProfile> {
        let mut profiles = self.profiles.write().await;
        let existing = profiles.get(&profile.identity_id).cloned();
        let merged = profile.merged_into(existing.as_ref());
        profiles.insert(merged.identity_id.clone(), merged.clone());
        Ok(merged)
    }

    async fn count_profiles(&self) -> StorageResult<usize> {
        Ok(self.profiles.read().await.len())
    }
}
