//! Client redirect gate
//!
//! [`decide`] is the decision table. [`ClientGate`] is the event shim the
//! rendered application drives: it tracks mount and identity-load state and
//! re-runs the table whenever path, principal or role changes.
//!
//! The role held here comes from the client's identity copy and is advisory
//! only. The edge gate re-validates every request against signed claims.

use crate::decision::{AccessDecision, AccessDenial, AccessEvaluation};
use crate::routes::RouteTable;
use crate::shell::{RenderContent, RenderPlan, ShellState};
use heal_types::{PrincipalId, RoleClaim, SessionClaims};
use serde::Serialize;
use std::sync::Arc;

/// Identity as the client sees it once loading finishes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ClientIdentity {
    pub principal: PrincipalId,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleClaim>,
}

impl ClientIdentity {
    pub fn new(principal: PrincipalId) -> Self {
        Self {
            principal,
            role: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<RoleClaim>) -> Self {
        self.role = Some(role.into());
        self
    }
}

impl From<&SessionClaims> for ClientIdentity {
    fn from(claims: &SessionClaims) -> Self {
        Self {
            principal: claims.sub.clone(),
            role: claims.role().cloned(),
        }
    }
}

/// Run the decision table for one (identity, path) pair. First match wins.
pub fn decide(
    table: &RouteTable,
    identity: Option<&ClientIdentity>,
    path: &str,
) -> AccessEvaluation {
    let evaluation = decide_unchecked(table, identity, path);

    // A redirect to where the principal already is would loop
    if evaluation.decision.target() == Some(path) {
        return AccessEvaluation::allow("already-there");
    }
    evaluation
}

fn decide_unchecked(
    table: &RouteTable,
    identity: Option<&ClientIdentity>,
    path: &str,
) -> AccessEvaluation {
    let Some(identity) = identity else {
        if table.is_client_public(path) {
            return AccessEvaluation::allow("public-page");
        }
        return AccessEvaluation::deny(
            AccessDecision::RedirectToLogin,
            AccessDenial::Unauthenticated,
            "signed-out",
        );
    };

    let Some(role) = identity.role.as_ref() else {
        if !table.is_onboarding(path) && !table.is_login(path) {
            return AccessEvaluation::deny(
                AccessDecision::RedirectToOnboarding,
                AccessDenial::IncompleteOnboarding,
                "role-unset",
            );
        }
        return AccessEvaluation::allow("onboarding-pending");
    };

    if let Some(required) = table.classify(path).required_role() {
        if !role.is(required) {
            return AccessEvaluation::deny(
                AccessDecision::own_dashboard(role),
                AccessDenial::RoleMismatch,
                "role-scope",
            );
        }
    }

    if table.is_login(path) || path == "/" {
        return AccessEvaluation::redirect(AccessDecision::landing(role), "signed-in-landing");
    }

    AccessEvaluation::allow("no-action")
}

/// Lifecycle of a mounted gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientPhase {
    /// First render has not happened; client-only APIs are unavailable
    Unmounted,

    /// Mounted, identity provider still loading
    AwaitingIdentity,

    /// Running the decision table
    Evaluating,

    /// Decision applied for the current state
    Settled,
}

/// Events the rendering framework feeds into the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// First render pass completed
    Mounted,

    /// Identity provider finished loading, with or without a principal
    IdentityLoaded(Option<ClientIdentity>),

    /// Router moved to a new path
    PathChanged(String),

    /// Sign-in, sign-out or role refresh
    PrincipalChanged(Option<ClientIdentity>),
}

/// A client-side navigation the gate wants performed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub target: String,

    /// Replace the history entry instead of pushing one
    pub replace: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<AccessDenial>,

    pub rule: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct EvaluationKey {
    identity: Option<ClientIdentity>,
    path: String,
}

/// Per-mount client gate
#[derive(Debug, Clone)]
pub struct ClientGate {
    table: Arc<RouteTable>,
    phase: ClientPhase,
    identity_loaded: bool,
    identity: Option<ClientIdentity>,
    path: String,
    last_evaluated: Option<EvaluationKey>,
}

impl ClientGate {
    pub fn new(table: Arc<RouteTable>, initial_path: impl Into<String>) -> Self {
        Self {
            table,
            phase: ClientPhase::Unmounted,
            identity_loaded: false,
            identity: None,
            path: initial_path.into(),
            last_evaluated: None,
        }
    }

    pub fn phase(&self) -> ClientPhase {
        self.phase
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn identity(&self) -> Option<&ClientIdentity> {
        self.identity.as_ref()
    }

    /// Apply an event. Returns a navigation at most once per distinct
    /// (identity, path) state; replaying the same state yields nothing.
    pub fn handle(&mut self, event: ClientEvent) -> Option<Navigation> {
        match event {
            ClientEvent::Mounted => {
                if self.phase == ClientPhase::Unmounted {
                    self.phase = ClientPhase::AwaitingIdentity;
                }
            }
            ClientEvent::IdentityLoaded(identity) => {
                self.identity_loaded = true;
                self.identity = identity;
            }
            ClientEvent::PathChanged(path) => self.path = path,
            ClientEvent::PrincipalChanged(identity) => self.identity = identity,
        }

        if self.phase == ClientPhase::Unmounted || !self.identity_loaded {
            return None;
        }
        self.evaluate()
    }

    fn evaluate(&mut self) -> Option<Navigation> {
        self.phase = ClientPhase::Evaluating;

        let key = EvaluationKey {
            identity: self.identity.clone(),
            path: self.path.clone(),
        };
        if self.last_evaluated.as_ref() == Some(&key) {
            self.phase = ClientPhase::Settled;
            return None;
        }

        let evaluation = decide(&self.table, self.identity.as_ref(), &self.path);
        self.last_evaluated = Some(key);
        self.phase = ClientPhase::Settled;

        let target = evaluation.decision.target()?.to_string();
        tracing::debug!(
            path = %self.path,
            target = %target,
            rule = evaluation.rule,
            "Client gate redirect"
        );
        Some(Navigation {
            target,
            replace: true,
            denial: evaluation.denial,
            rule: evaluation.rule,
        })
    }

    /// Layout instructions for the current phase
    pub fn render(&self, shell: &ShellState) -> RenderPlan {
        let content = match self.phase {
            ClientPhase::Unmounted => RenderContent::Nothing,
            _ => RenderContent::Children,
        };
        RenderPlan {
            content,
            offline_banner: content == RenderContent::Children && shell.is_offline(),
            theme: shell.theme,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::Connectivity;
    use heal_types::Role;

    fn table() -> RouteTable {
        RouteTable::default()
    }

    fn with_role(role: Role) -> ClientIdentity {
        ClientIdentity::new(PrincipalId::new("user_1")).with_role(role)
    }

    fn no_role() -> ClientIdentity {
        ClientIdentity::new(PrincipalId::new("user_1"))
    }

    fn target(identity: Option<&ClientIdentity>, path: &str) -> Option<String> {
        decide(&table(), identity, path)
            .decision
            .target()
            .map(str::to_string)
    }

    #[test]
    fn test_signed_out_on_protected_page_goes_to_login() {
        assert_eq!(target(None, "/patient/dashboard"), Some("/login".into()));
        assert_eq!(target(None, "/settings"), Some("/login".into()));
    }

    #[test]
    fn test_signed_out_on_public_page_stays() {
        for page in table().public_pages() {
            assert_eq!(target(None, page), None, "{page}");
        }
        assert_eq!(target(None, "/login/factor-one"), None);
    }

    #[test]
    fn test_role_mismatch_goes_to_own_dashboard() {
        let doctor = with_role(Role::Doctor);
        assert_eq!(
            target(Some(&doctor), "/admin/anything"),
            Some("/doctor/dashboard".into())
        );
        assert_eq!(
            target(Some(&doctor), "/patient/anything"),
            Some("/doctor/dashboard".into())
        );

        let admin = with_role(Role::Admin);
        assert_eq!(
            target(Some(&admin), "/doctor/schedule"),
            Some("/admin/dashboard".into())
        );
    }

    #[test]
    fn test_matching_role_stays() {
        assert_eq!(target(Some(&with_role(Role::Patient)), "/patient/records"), None);
        assert_eq!(target(Some(&with_role(Role::Doctor)), "/monitoring"), None);
    }

    #[test]
    fn test_no_role_goes_to_onboarding() {
        let identity = no_role();
        assert_eq!(target(Some(&identity), "/faq"), Some("/onboarding".into()));
        assert_eq!(target(Some(&identity), "/"), Some("/onboarding".into()));
        assert_eq!(target(Some(&identity), "/onboarding"), None);
        assert_eq!(target(Some(&identity), "/login/sso"), None);
    }

    #[test]
    fn test_signed_in_landing_goes_to_dashboard() {
        for role in Role::ALL {
            let identity = with_role(role);
            assert_eq!(target(Some(&identity), "/"), Some(role.dashboard_path()));
            assert_eq!(target(Some(&identity), "/login"), Some(role.dashboard_path()));
        }
    }

    #[test]
    fn test_unrecognized_role_lands_on_its_own_dashboard_without_looping() {
        let identity = ClientIdentity::new(PrincipalId::new("user_1"))
            .with_role(RoleClaim::Unrecognized("nurse".into()));
        // role mismatch has no dashboard to fall back on
        assert_eq!(target(Some(&identity), "/admin"), Some("/login".into()));
        assert_eq!(target(Some(&identity), "/"), Some("/nurse/dashboard".into()));
        assert_eq!(target(Some(&identity), "/login"), Some("/nurse/dashboard".into()));
        assert_eq!(target(Some(&identity), "/nurse/dashboard"), None);
    }

    #[test]
    fn test_gate_waits_for_mount_and_identity() {
        let mut gate = ClientGate::new(Arc::new(table()), "/patient/dashboard");
        assert_eq!(gate.phase(), ClientPhase::Unmounted);

        assert!(gate.handle(ClientEvent::IdentityLoaded(None)).is_none());
        assert_eq!(gate.phase(), ClientPhase::Unmounted);

        let nav = gate.handle(ClientEvent::Mounted).unwrap();
        assert_eq!(nav.target, "/login");
        assert!(nav.replace);
        assert_eq!(gate.phase(), ClientPhase::Settled);
    }

    #[test]
    fn test_gate_awaits_identity_after_mount() {
        let mut gate = ClientGate::new(Arc::new(table()), "/admin");
        assert!(gate.handle(ClientEvent::Mounted).is_none());
        assert_eq!(gate.phase(), ClientPhase::AwaitingIdentity);

        let nav = gate
            .handle(ClientEvent::IdentityLoaded(Some(with_role(Role::Patient))))
            .unwrap();
        assert_eq!(nav.target, "/patient/dashboard");
        assert_eq!(nav.denial, Some(AccessDenial::RoleMismatch));
    }

    #[test]
    fn test_gate_redirects_once_per_state() {
        let mut gate = ClientGate::new(Arc::new(table()), "/faq");
        gate.handle(ClientEvent::Mounted);
        let nav = gate.handle(ClientEvent::IdentityLoaded(Some(no_role())));
        assert_eq!(nav.map(|n| n.target), Some("/onboarding".into()));

        // Same state replayed: no second navigation
        assert!(gate
            .handle(ClientEvent::PrincipalChanged(Some(no_role())))
            .is_none());
        assert!(gate.handle(ClientEvent::PathChanged("/faq".into())).is_none());

        // Router lands on onboarding: settled, nothing more to do
        assert!(gate
            .handle(ClientEvent::PathChanged("/onboarding".into()))
            .is_none());

        // A new path re-enters evaluation
        let nav = gate.handle(ClientEvent::PathChanged("/contact".into()));
        assert_eq!(nav.map(|n| n.target), Some("/onboarding".into()));
    }

    #[test]
    fn test_gate_reevaluates_on_role_change() {
        let mut gate = ClientGate::new(Arc::new(table()), "/onboarding");
        gate.handle(ClientEvent::Mounted);
        assert!(gate
            .handle(ClientEvent::IdentityLoaded(Some(no_role())))
            .is_none());

        // Onboarding finished and the session was refreshed
        let nav = gate.handle(ClientEvent::PrincipalChanged(Some(with_role(Role::Doctor))));
        assert!(nav.is_none());

        let nav = gate.handle(ClientEvent::PathChanged("/".into())).unwrap();
        assert_eq!(nav.target, "/doctor/dashboard");
        assert!(nav.denial.is_none());
    }

    #[test]
    fn test_render_hides_content_until_mounted() {
        let shell = ShellState::default().with_connectivity(Connectivity::Offline);
        let mut gate = ClientGate::new(Arc::new(table()), "/");

        let plan = gate.render(&shell);
        assert_eq!(plan.content, RenderContent::Nothing);
        assert!(!plan.offline_banner);

        gate.handle(ClientEvent::Mounted);
        let plan = gate.render(&shell);
        assert_eq!(plan.content, RenderContent::Children);
        assert!(plan.offline_banner);
    }
}
