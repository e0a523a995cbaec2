//! Principals as the identity provider stores them

use crate::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh identifier in the provider's `user_` format
    pub fn generate() -> Self {
        Self(format!("user_{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Public metadata the onboarding flow writes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    #[serde(default)]
    pub onboarding_complete: bool,
}

impl PrincipalMetadata {
    /// Metadata after a completed onboarding
    pub fn onboarded(role: Role) -> Self {
        Self {
            role: Some(role),
            onboarding_complete: true,
        }
    }
}

/// The authenticated actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,

    pub metadata: PrincipalMetadata,

    #[serde(default)]
    pub email_addresses: Vec<String>,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Principal {
    /// A freshly signed-in principal with no role yet
    pub fn new(id: PrincipalId) -> Self {
        Self {
            id,
            metadata: PrincipalMetadata::default(),
            email_addresses: Vec::new(),
            first_name: None,
            last_name: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email_addresses.push(email.into());
        self
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    pub fn with_metadata(mut self, metadata: PrincipalMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn role(&self) -> Option<Role> {
        self.metadata.role
    }

    pub fn is_onboarded(&self) -> bool {
        self.metadata.onboarding_complete
    }
}
