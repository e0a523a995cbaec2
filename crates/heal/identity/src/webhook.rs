//! Identity provider webhooks
//!
//! Deliveries are signed the Svix way: `v1,<base64(MAC)>` where MAC is
//! HMAC-SHA256 over `"{id}.{timestamp}.{body}"`, keyed with the base64 part
//! of a `whsec_` secret. A header may carry several space-separated
//! signatures (during secret rotation); any match is accepted.

use crate::error::WebhookError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use heal_types::{PrincipalId, UserProfile};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Accepted clock skew between sender and receiver
pub const SIGNATURE_TOLERANCE_SECS: i64 = 5 * 60;

const SECRET_PREFIX: &str = "whsec_";

/// The three signature headers
#[derive(Debug, Clone, Default)]
pub struct WebhookHeaders {
    pub id: Option<String>,
    pub timestamp: Option<String>,
    pub signature: Option<String>,
}

/// Authenticates webhook deliveries
#[derive(Clone)]
pub struct WebhookVerifier {
    keyed: HmacSha256,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WebhookVerifier(<redacted>)")
    }
}

impl WebhookVerifier {
    /// Build from a signing secret, with or without the `whsec_` prefix
    pub fn new(secret: &str) -> Result<Self, WebhookError> {
        let encoded = secret.trim();
        let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
        let key = STANDARD
            .decode(encoded)
            .map_err(|e| WebhookError::InvalidSecret(e.to_string()))?;
        if key.is_empty() {
            return Err(WebhookError::InvalidSecret("empty key".to_string()));
        }
        let keyed = HmacSha256::new_from_slice(&key)
            .map_err(|e| WebhookError::InvalidSecret(e.to_string()))?;
        Ok(Self { keyed })
    }

    fn mac(&self, id: &str, timestamp: &str, body: &[u8]) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        mac
    }

    /// Produce a signature header value. Used by senders and tests.
    pub fn sign(&self, id: &str, timestamp: &str, body: &[u8]) -> String {
        let tag = self.mac(id, timestamp, body).finalize().into_bytes();
        format!("v1,{}", STANDARD.encode(tag))
    }

    pub fn verify(&self, headers: &WebhookHeaders, body: &[u8]) -> Result<WebhookEvent, WebhookError> {
        self.verify_at(headers, body, Utc::now())
    }

    /// Check headers, timestamp window and signature, then parse the body
    pub fn verify_at(
        &self,
        headers: &WebhookHeaders,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<WebhookEvent, WebhookError> {
        let id = headers
            .id
            .as_deref()
            .ok_or(WebhookError::MissingHeader("svix-id"))?;
        let timestamp = headers
            .timestamp
            .as_deref()
            .ok_or(WebhookError::MissingHeader("svix-timestamp"))?;
        let signatures = headers
            .signature
            .as_deref()
            .ok_or(WebhookError::MissingHeader("svix-signature"))?;

        let sent_at: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| WebhookError::InvalidTimestamp)?;
        let skew = now.timestamp().checked_sub(sent_at).map(i64::unsigned_abs);
        match skew {
            Some(skew) if skew <= SIGNATURE_TOLERANCE_SECS.unsigned_abs() => {}
            _ => return Err(WebhookError::TimestampOutOfRange),
        }

        let matched = signatures.split_whitespace().any(|candidate| {
            let Some(("v1", encoded)) = candidate.split_once(',') else {
                return false;
            };
            let Ok(bytes) = STANDARD.decode(encoded) else {
                return false;
            };
            // constant-time comparison
            self.mac(id, timestamp, body).verify_slice(&bytes).is_ok()
        });
        if !matched {
            return Err(WebhookError::NoMatchingSignature);
        }

        serde_json::from_slice(body).map_err(|e| WebhookError::Payload(e.to_string()))
    }
}

/// A webhook delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,

    pub data: serde_json::Value,
}

impl WebhookEvent {
    /// User payload for `user.created` / `user.updated`, `None` for other events
    pub fn user(&self) -> Result<Option<WebhookUser>, WebhookError> {
        match self.event_type.as_str() {
            "user.created" | "user.updated" => serde_json::from_value(self.data.clone())
                .map(Some)
                .map_err(|e| WebhookError::Payload(e.to_string())),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub email_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicMetadata {
    #[serde(default)]
    pub role: Option<String>,
}

/// User object carried by user events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookUser {
    pub id: PrincipalId,

    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    #[serde(default)]
    pub public_metadata: PublicMetadata,
}

impl WebhookUser {
    /// Profile mirror record for this user as of `now`
    pub fn to_profile(&self, now: DateTime<Utc>) -> UserProfile {
        let email = self
            .email_addresses
            .first()
            .map(|e| e.email_address.clone())
            .unwrap_or_default();

        let full_name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string();
        let full_name = if full_name.is_empty() {
            "User".to_string()
        } else {
            full_name
        };

        let role = self
            .public_metadata
            .role
            .clone()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "patient".to_string());

        UserProfile {
            identity_id: self.id.clone(),
            email,
            full_name,
            role,
            created_at: now,
            updated_at: now,
        }
    }
}
