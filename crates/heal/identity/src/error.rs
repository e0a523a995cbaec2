//! Error types for heal-identity

use heal_types::PrincipalId;
use thiserror::Error;

/// Session token failures. Every variant means "no valid session".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Token is not `<claims>.<signature>` in base64url
    #[error("Malformed session token: {0}")]
    Malformed(String),

    /// Signature does not verify against the provider key
    #[error("Session signature invalid")]
    BadSignature,

    /// Token is past its expiry
    #[error("Session expired")]
    Expired,

    /// Claims could not be encoded
    #[error("Claims encoding failed: {0}")]
    Encoding(String),
}

/// Identity provider failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Principal does not exist
    #[error("Unknown principal: {0}")]
    UnknownPrincipal(PrincipalId),

    /// Session issuance failed
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Provider backend unavailable
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

/// Onboarding submission failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OnboardingError {
    /// Role missing or outside the closed set
    #[error("Invalid role selected.")]
    InvalidRole,

    /// Admin role requested with a wrong or missing authorization code
    #[error("Invalid admin authorization code.")]
    AdminCodeInvalid,

    /// Principal has already completed onboarding; the role is fixed
    #[error("Onboarding already completed.")]
    AlreadyOnboarded,

    /// Metadata update or session refresh failed
    #[error("Failed to update profile data: {0}")]
    Provider(#[from] ProviderError),
}

/// Webhook authentication and payload failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Signing secret is not a base64 key (optionally `whsec_` prefixed)
    #[error("Invalid webhook secret: {0}")]
    InvalidSecret(String),

    /// One of the signature headers is absent
    #[error("Missing webhook header: {0}")]
    MissingHeader(&'static str),

    /// Timestamp header is not a unix timestamp
    #[error("Invalid webhook timestamp")]
    InvalidTimestamp,

    /// Timestamp outside the tolerance window
    #[error("Webhook timestamp outside tolerance")]
    TimestampOutOfRange,

    /// No signature matched
    #[error("No matching webhook signature")]
    NoMatchingSignature,

    /// Body is not a webhook event
    #[error("Invalid webhook payload: {0}")]
    Payload(String),
}
