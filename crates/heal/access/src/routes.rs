//! Route classification
//!
//! A single ordered table maps path patterns to the capability a request
//! needs. Classification is a pure function of the path string.

use crate::error::{Result, RouteTableError};
use heal_types::Role;
use serde::Serialize;

/// Where unauthenticated principals are sent
pub const LOGIN_PATH: &str = "/login";

/// The one path an authenticated but un-onboarded principal may reach
pub const ONBOARDING_PATH: &str = "/onboarding";

/// Identity provider webhook, exempt from interactive auth
pub const WEBHOOK_PATH: &str = "/api/auth/webhook/clerk";

/// Pages reachable without authentication on the client
const DEFAULT_PUBLIC_PAGES: &[&str] = &[
    "/",
    "/login",
    "/faq",
    "/contact",
    "/about",
    "/privacy",
    "/terms",
    "/how-it-works",
    "/open-source",
    "/support",
    "/appointments",
    "/monitoring",
    "/prescriptions",
    "/feedback",
    "/onboarding",
];

/// Path pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum PathPattern {
    /// Matches one path exactly
    Exact(String),

    /// Matches any path starting with the string (`/patient` matches `/patients`)
    Prefix(String),
}

impl PathPattern {
    pub fn exact(path: impl Into<String>) -> Self {
        Self::Exact(path.into())
    }

    pub fn prefix(path: impl Into<String>) -> Self {
        Self::Prefix(path.into())
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(p) => path == p,
            PathPattern::Prefix(p) => path.starts_with(p.as_str()),
        }
    }
}

/// Capability a route requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum RouteClass {
    /// Reachable by anyone
    Public,

    /// Webhook relay, never subject to interactive auth
    WebhookExempt,

    /// The onboarding page
    Onboarding,

    /// Sign-in pages
    Login,

    /// Requires a session, and a specific role when `role` is set
    Protected { role: Option<Role> },
}

impl RouteClass {
    pub fn is_protected(&self) -> bool {
        matches!(self, RouteClass::Protected { .. })
    }

    pub fn required_role(&self) -> Option<Role> {
        match self {
            RouteClass::Protected { role } => *role,
            _ => None,
        }
    }
}

/// One row of the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRule {
    pub pattern: PathPattern,
    pub class: RouteClass,
}

impl RouteRule {
    pub fn new(pattern: PathPattern, class: RouteClass) -> Self {
        Self { pattern, class }
    }
}

/// Ordered route table shared by the edge and client gates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
    public_pages: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
            .with_rule(PathPattern::exact(WEBHOOK_PATH), RouteClass::WebhookExempt)
            .with_rule(PathPattern::exact(ONBOARDING_PATH), RouteClass::Onboarding)
            .with_rule(PathPattern::prefix(LOGIN_PATH), RouteClass::Login)
            .with_rule(
                PathPattern::prefix("/admin"),
                RouteClass::Protected {
                    role: Some(Role::Admin),
                },
            )
            .with_rule(
                PathPattern::prefix("/doctor"),
                RouteClass::Protected {
                    role: Some(Role::Doctor),
                },
            )
            .with_rule(
                PathPattern::prefix("/patient"),
                RouteClass::Protected {
                    role: Some(Role::Patient),
                },
            )
            .with_rule(
                PathPattern::prefix("/monitoring"),
                RouteClass::Protected { role: None },
            )
            .with_public_pages(DEFAULT_PUBLIC_PAGES.iter().copied())
    }
}

impl RouteTable {
    /// An empty table: every path is public
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            public_pages: Vec::new(),
        }
    }

    /// Append a rule. Earlier rules win.
    pub fn with_rule(mut self, pattern: PathPattern, class: RouteClass) -> Self {
        self.rules.push(RouteRule::new(pattern, class));
        self
    }

    /// Extend the client public allow-list
    pub fn with_public_pages<I, S>(mut self, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_pages.extend(pages.into_iter().map(Into::into));
        self
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn public_pages(&self) -> &[String] {
        &self.public_pages
    }

    /// Classify a path. Unmatched paths are public.
    pub fn classify(&self, path: &str) -> RouteClass {
        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(path))
            .map(|rule| rule.class)
            .unwrap_or(RouteClass::Public)
    }

    /// Whether the client lets an anonymous visitor stay on `path`
    pub fn is_client_public(&self, path: &str) -> bool {
        self.public_pages.iter().any(|page| page == path) || self.is_login(path)
    }

    pub fn is_login(&self, path: &str) -> bool {
        path.starts_with(LOGIN_PATH)
    }

    pub fn is_onboarding(&self, path: &str) -> bool {
        path == ONBOARDING_PATH
    }

    /// Check the invariants that keep the two gates from bouncing a
    /// principal between each other.
    pub fn validate(&self) -> Result<()> {
        for target in [LOGIN_PATH, ONBOARDING_PATH] {
            if !self.is_client_public(target) {
                return Err(RouteTableError::RedirectTargetNotPublic(target.to_string()));
            }
            if self.classify(target).is_protected() {
                return Err(RouteTableError::RedirectTargetProtected(target.to_string()));
            }
        }

        for page in &self.public_pages {
            if let Some(role) = self.classify(page).required_role() {
                return Err(RouteTableError::PublicPageRoleScoped {
                    path: page.clone(),
                    role,
                });
            }
        }

        for role in Role::ALL {
            let dashboard = role.dashboard_path();
            match self.classify(&dashboard) {
                RouteClass::Protected { role: Some(r) } if r == role => {}
                other => {
                    return Err(RouteTableError::DashboardMisclassified {
                        path: dashboard,
                        class: format!("{:?}", other),
                    })
                }
            }
        }

        Ok(())
    }
}
