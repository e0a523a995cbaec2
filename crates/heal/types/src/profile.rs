//! Denormalized user profile kept in the document store

use crate::principal::PrincipalId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile mirror written by the identity webhook relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub identity_id: PrincipalId,
    pub email: String,
    pub full_name: String,

    /// Raw role string as the provider reported it
    pub role: String,

    /// Set on first write only
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Merge a fresh sync into an existing record, keeping `created_at`
    pub fn merged_into(mut self, existing: Option<&UserProfile>) -> Self {
        if let Some(existing) = existing {
            self.created_at = existing.created_at;
        }
        self
    }
}
