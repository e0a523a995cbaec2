//! Edge gate
//!
//! Runs once per inbound request, before any handler. The caller passes
//! claims only after verifying the session signature; a missing or invalid
//! session is `None`.

use crate::decision::{AccessDecision, AccessDenial, AccessEvaluation};
use crate::routes::{RouteClass, RouteTable};
use heal_types::SessionClaims;
use std::sync::Arc;

/// Edge enforcement knobs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgePolicy {
    /// Also enforce role-to-subtree matching at the edge. Off by default:
    /// the edge checks authentication and onboarding only and leaves role
    /// matching to the client gate.
    pub enforce_roles: bool,
}

impl EdgePolicy {
    pub fn strict() -> Self {
        Self {
            enforce_roles: true,
        }
    }
}

/// Server-side access checkpoint
#[derive(Debug, Clone)]
pub struct EdgeGate {
    table: Arc<RouteTable>,
    policy: EdgePolicy,
}

impl EdgeGate {
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self {
            table,
            policy: EdgePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: EdgePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn policy(&self) -> EdgePolicy {
        self.policy
    }

    /// Decide what happens to a request for `path`.
    ///
    /// `RedirectToLogin` means "challenge": the caller hands the request to
    /// the identity provider's own sign-in flow.
    pub fn evaluate(&self, path: &str, session: Option<&SessionClaims>) -> AccessEvaluation {
        let required_role = match self.table.classify(path) {
            RouteClass::WebhookExempt => return AccessEvaluation::allow("webhook-exempt"),
            RouteClass::Protected { role } => role,
            _ => return AccessEvaluation::allow("unprotected"),
        };

        let Some(claims) = session else {
            return AccessEvaluation::deny(
                AccessDecision::RedirectToLogin,
                AccessDenial::Unauthenticated,
                "session-required",
            );
        };

        if !claims.onboarding_complete() && !self.table.is_onboarding(path) {
            return AccessEvaluation::deny(
                AccessDecision::RedirectToOnboarding,
                AccessDenial::IncompleteOnboarding,
                "onboarding-required",
            );
        }

        if self.policy.enforce_roles {
            if let Some(required) = required_role {
                match claims.role() {
                    Some(claim) if claim.is(required) => {}
                    Some(claim) => {
                        return AccessEvaluation::deny(
                            AccessDecision::own_dashboard(claim),
                            AccessDenial::RoleMismatch,
                            "role-scope",
                        );
                    }
                    None => {
                        return AccessEvaluation::deny(
                            AccessDecision::RedirectToOnboarding,
                            AccessDenial::IncompleteOnboarding,
                            "role-missing",
                        );
                    }
                }
            }
        }

        AccessEvaluation::allow("session-valid")
    }
}

/// Static asset extensions the edge never inspects. Each entry matches as a
/// prefix of whatever follows a `.` in the path.
const SKIPPED_EXTENSIONS: &[&str] = &[
    "htm",
    "css",
    "jpg",
    "jpeg",
    "webp",
    "png",
    "gif",
    "svg",
    "ttf",
    "woff",
    "ico",
    "csv",
    "doc",
    "xls",
    "zip",
    "webmanifest",
];

/// Decides which request paths the edge gate runs for at all
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeMatcher;

impl EdgeMatcher {
    pub fn applies(&self, path: &str) -> bool {
        if path.starts_with("/api") || path.starts_with("/trpc") {
            return true;
        }

        let rest = path.strip_prefix('/').unwrap_or(path);
        if rest.starts_with("_next") {
            return false;
        }

        !Self::is_static_asset(rest)
    }

    fn is_static_asset(path: &str) -> bool {
        let path = path.split('?').next().unwrap_or(path);
        path.match_indices('.').any(|(idx, _)| {
            let ext = &path[idx + 1..];
            // `.js` is an asset, `.json` is not
            (ext.starts_with("js") && !ext[2..].starts_with("on"))
                || SKIPPED_EXTENSIONS.iter().any(|skip| ext.starts_with(skip))
        })
    }
}
