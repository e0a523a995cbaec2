//! # Heal Access
//!
//! Role-based access control for the Heal portal.
//!
//! ## Overview
//!
//! Two checkpoints decide whether a principal may reach a route:
//!
//! - [`EdgeGate`]: runs before a request reaches any handler. Authenticates,
//!   decides whether the path is protected and forces principals who have not
//!   finished onboarding to the onboarding page.
//! - [`ClientGate`]: runs in the rendered application once identity data has
//!   loaded. Re-validates role against path and issues client navigations.
//!
//! Both derive their behavior from one [`RouteTable`], so a path cannot be
//! classified one way at the edge and another way on the client.
//!
//! ## Example
//!
//! ```rust
//! use heal_access::{AccessDecision, ClientIdentity, EdgeGate, RouteTable};
//! use heal_types::{PrincipalId, Role};
//! use std::sync::Arc;
//!
//! let table = Arc::new(RouteTable::default());
//! let edge = EdgeGate::new(table.clone());
//!
//! // No session on a protected path: defer to the identity provider.
//! let evaluation = edge.evaluate("/patient/dashboard", None);
//! assert_eq!(evaluation.decision, AccessDecision::RedirectToLogin);
//!
//! // A doctor browsing the admin tree is sent home.
//! let doctor = ClientIdentity::new(PrincipalId::new("user_1")).with_role(Role::Doctor);
//! let evaluation = heal_access::client::decide(&table, Some(&doctor), "/admin/users");
//! assert_eq!(evaluation.decision.target(), Some("/doctor/dashboard"));
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod client;
pub mod decision;
pub mod edge;
pub mod error;
pub mod routes;
pub mod shell;

pub use client::{ClientEvent, ClientGate, ClientIdentity, ClientPhase, Navigation};
pub use decision::{AccessDecision, AccessDenial, AccessEvaluation};
pub use edge::{EdgeGate, EdgeMatcher, EdgePolicy};
pub use error::{Result, RouteTableError};
pub use routes::{PathPattern, RouteClass, RouteRule, RouteTable};
pub use shell::{Connectivity, RenderContent, RenderPlan, ShellState, Theme, ThemeSignals};
