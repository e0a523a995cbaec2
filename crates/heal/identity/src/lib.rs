//! # Heal Identity
//!
//! The identity collaborator behind the Heal access gates.
//!
//! ## Key Components
//!
//! - [`SessionIssuer`] / [`SessionVerifier`]: Ed25519-signed session tokens.
//!   The verifier holds only public key material and is shared read-only
//!   across requests.
//! - [`IdentityProvider`]: principal lookup, metadata updates and session
//!   issuance; [`LocalIdentityProvider`] keeps everything in memory.
//! - [`OnboardingService`]: the one-time role selection, including the admin
//!   authorization code check.
//! - [`WebhookVerifier`]: authenticates identity provider webhooks before
//!   their user events are mirrored into the profile store.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod error;
pub mod onboarding;
pub mod provider;
pub mod session;
pub mod webhook;

pub use error::{OnboardingError, ProviderError, SessionError, WebhookError};
pub use onboarding::{AdminCode, OnboardingOutcome, OnboardingRequest, OnboardingService};
pub use provider::{IdentityProvider, LocalIdentityProvider};
pub use session::{SessionIssuer, SessionVerifier, DEFAULT_SESSION_TTL_SECS};
pub use webhook::{
    WebhookEvent, WebhookHeaders, WebhookUser, WebhookVerifier, SIGNATURE_TOLERANCE_SECS,
};
