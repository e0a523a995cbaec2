//! Session tokens
//!
//! Wire format: `base64url(claims JSON) "." base64url(Ed25519 signature)`,
//! both without padding. The signature covers the encoded claims segment.

use crate::error::SessionError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use heal_types::{ClaimsMetadata, PrincipalId, SessionClaims};

/// Default session lifetime
pub const DEFAULT_SESSION_TTL_SECS: i64 = 60 * 60;

/// Signs session claims. Only the identity provider holds one.
#[derive(Clone)]
pub struct SessionIssuer {
    signing_key: SigningKey,
    ttl: Duration,
}

impl std::fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("verifying_key", &self.signing_key.verifying_key())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionIssuer {
    /// Deterministic issuer from a 32-byte seed
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
            ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        }
    }

    /// Issuer with a fresh random key
    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        Self {
            signing_key: SigningKey::generate(&mut rng),
            ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Verifier sharing this issuer's public key
    pub fn verifier(&self) -> SessionVerifier {
        SessionVerifier::new(self.signing_key.verifying_key())
    }

    /// Mint claims for a principal and sign them
    pub fn issue(
        &self,
        sub: PrincipalId,
        metadata: ClaimsMetadata,
    ) -> Result<String, SessionError> {
        self.sign(&SessionClaims::new(sub, metadata, self.ttl))
    }

    /// Sign pre-built claims
    pub fn sign(&self, claims: &SessionClaims) -> Result<String, SessionError> {
        let json =
            serde_json::to_vec(claims).map_err(|e| SessionError::Encoding(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = self.signing_key.sign(payload.as_bytes());
        Ok(format!(
            "{}.{}",
            payload,
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }
}

/// Verifies session tokens with public key material only
#[derive(Debug, Clone)]
pub struct SessionVerifier {
    verifying_key: VerifyingKey,
}

impl SessionVerifier {
    pub fn new(verifying_key: VerifyingKey) -> Self {
        Self { verifying_key }
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify the signature first, then decode claims and check expiry.
    /// Claims are never parsed from an unverified payload.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| SessionError::Malformed("missing signature segment".into()))?;

        let sig_bytes = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|e| SessionError::Malformed(e.to_string()))?;
        let sig_array: [u8; 64] = sig_bytes
            .as_slice()
            .try_into()
            .map_err(|_| SessionError::Malformed("signature length".into()))?;
        let signature = Signature::from_bytes(&sig_array);

        self.verifying_key
            .verify(payload.as_bytes(), &signature)
            .map_err(|_| SessionError::BadSignature)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| SessionError::Malformed(e.to_string()))?;
        let claims: SessionClaims =
            serde_json::from_slice(&json).map_err(|e| SessionError::Malformed(e.to_string()))?;

        if claims.is_expired_at(now) {
            return Err(SessionError::Expired);
        }
        Ok(claims)
    }
}
