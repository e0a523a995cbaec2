//! Storage trait definitions

use crate::error::StorageError;
use async_trait::async_trait;
use heal_types::{PrincipalId, UserProfile};

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage for user profile mirrors
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Get a profile by identity id
    async fn get_profile(&self, id: &PrincipalId) -> StorageResult<Option<UserProfile>>;

    /// Create or merge a profile. `created_at` of an existing record is
    /// kept; returns the stored record.
    async fn upsert_profile(&self, profile: UserProfile) -> StorageResult<UserProfile>;

    /// Number of stored profiles
    async fn count_profiles(&self) -> StorageResult<usize>;
}
