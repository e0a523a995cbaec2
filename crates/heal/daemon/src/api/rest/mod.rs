//! REST surface: router, shared state, edge middleware and handlers

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use middleware::CurrentSession;
pub use state::AppState;
