//! Heal Types - shared vocabulary for the Heal portal
//!
//! Every other Heal crate speaks in these types:
//!
//! - **Role**: the closed set of portal roles (patient, doctor, admin)
//! - **RoleClaim**: what a session or client identity actually carries,
//!   which may be a role string outside the closed set
//! - **Principal**: the authenticated actor as the identity provider knows it
//! - **SessionClaims**: the signed claims attached to a request
//! - **UserProfile**: the denormalized profile mirror kept in the document store

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod principal;
pub mod profile;
pub mod role;
pub mod session;

pub use principal::{Principal, PrincipalId, PrincipalMetadata};
pub use profile::UserProfile;
pub use role::{Role, RoleClaim, RoleParseError};
pub use session::{ClaimsMetadata, SessionClaims};
