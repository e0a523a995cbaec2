//! Access decisions
//!
//! Decisions are routing outcomes, not errors. Every redirect carries the
//! denial that caused it (if any) and the name of the rule that fired, so
//! callers can log a decision without re-deriving it.

use crate::routes::{LOGIN_PATH, ONBOARDING_PATH};
use heal_types::RoleClaim;
use serde::Serialize;
use std::fmt;

/// Outcome of evaluating a principal against a route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AccessDecision {
    /// Let the request or render proceed
    Allow,

    /// Send the principal to sign in
    RedirectToLogin,

    /// Send the principal to choose a role
    RedirectToOnboarding,

    /// Send the principal to the landing page for their role
    RedirectToOwnDashboard { target: String },
}

impl AccessDecision {
    /// Dashboard redirect after a role mismatch. Claims outside the closed
    /// role set have no dashboard to fall back on and go to sign-in.
    pub fn own_dashboard(role: &RoleClaim) -> Self {
        match role.role() {
            Some(role) => Self::RedirectToOwnDashboard {
                target: role.dashboard_path(),
            },
            None => Self::RedirectToLogin,
        }
    }

    /// Redirect for a signed-in principal on a landing page: always
    /// `/{role}/dashboard`, even for an unrecognized role.
    pub fn landing(role: &RoleClaim) -> Self {
        Self::RedirectToOwnDashboard {
            target: role.dashboard_path(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Path the principal should end up on, if this is a redirect
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Allow => None,
            Self::RedirectToLogin => Some(LOGIN_PATH),
            Self::RedirectToOnboarding => Some(ONBOARDING_PATH),
            Self::RedirectToOwnDashboard { target } => Some(target),
        }
    }
}

/// Why a principal was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDenial {
    /// No valid session on a protected resource
    Unauthenticated,

    /// Authenticated, role not yet chosen
    IncompleteOnboarding,

    /// Authenticated with a role, wrong subtree
    RoleMismatch,
}

impl fmt::Display for AccessDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccessDenial::Unauthenticated => "unauthenticated",
            AccessDenial::IncompleteOnboarding => "incomplete_onboarding",
            AccessDenial::RoleMismatch => "role_mismatch",
        };
        f.write_str(s)
    }
}

/// A decision plus the rule that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessEvaluation {
    pub decision: AccessDecision,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<AccessDenial>,

    pub rule: &'static str,
}

impl AccessEvaluation {
    pub fn allow(rule: &'static str) -> Self {
        Self {
            decision: AccessDecision::Allow,
            denial: None,
            rule,
        }
    }

    pub fn redirect(decision: AccessDecision, rule: &'static str) -> Self {
        Self {
            decision,
            denial: None,
            rule,
        }
    }

    pub fn deny(decision: AccessDecision, denial: AccessDenial, rule: &'static str) -> Self {
        Self {
            decision,
            denial: Some(denial),
            rule,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.decision.is_allowed()
    }
}
