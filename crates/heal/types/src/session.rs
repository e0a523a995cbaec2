//! Signed session claims
//!
//! Claims are only ever constructed by the identity provider and read after
//! signature verification. Nothing in this crate verifies them.

use crate::principal::{PrincipalId, PrincipalMetadata};
use crate::role::{Role, RoleClaim};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Metadata embedded in the session claims
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsMetadata {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_role"
    )]
    pub role: Option<RoleClaim>,

    #[serde(default)]
    pub onboarding_complete: bool,
}

/// Absent, null and empty roles all mean "no role yet"
fn deserialize_role<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<RoleClaim>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|r| RoleClaim::from_raw(&r)))
}

impl From<&PrincipalMetadata> for ClaimsMetadata {
    fn from(metadata: &PrincipalMetadata) -> Self {
        Self {
            role: metadata.role.map(RoleClaim::Known),
            onboarding_complete: metadata.onboarding_complete,
        }
    }
}

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Principal the session belongs to
    pub sub: PrincipalId,

    /// Session identifier
    pub sid: String,

    /// Issued at (unix seconds)
    pub iat: i64,

    /// Expires at (unix seconds)
    pub exp: i64,

    #[serde(default)]
    pub metadata: ClaimsMetadata,
}

impl SessionClaims {
    pub fn new(sub: PrincipalId, metadata: ClaimsMetadata, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub,
            sid: format!("sess_{}", uuid::Uuid::new_v4().simple()),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            metadata,
        }
    }

    pub fn role(&self) -> Option<&RoleClaim> {
        self.metadata.role.as_ref()
    }

    pub fn known_role(&self) -> Option<Role> {
        self.metadata.role.as_ref().and_then(RoleClaim::role)
    }

    pub fn onboarding_complete(&self) -> bool {
        self.metadata.onboarding_complete
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}
