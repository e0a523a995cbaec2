//! Error types for heal-access

use heal_types::Role;
use thiserror::Error;

/// Route table inconsistencies that would let the gates loop a principal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTableError {
    /// A gate redirect target is missing from the client allow-list
    #[error("redirect target {0} is not a public page")]
    RedirectTargetNotPublic(String),

    /// A gate redirect target requires a session
    #[error("redirect target {0} is classified as protected")]
    RedirectTargetProtected(String),

    /// A public page sits under a role-scoped prefix
    #[error("public page {path} is scoped to role {role}")]
    PublicPageRoleScoped { path: String, role: Role },

    /// A role dashboard does not resolve to its own role
    #[error("dashboard {path} classified as {class}")]
    DashboardMisclassified { path: String, class: String },
}

/// Result type alias for route table operations
pub type Result<T> = std::result::Result<T, RouteTableError>;
