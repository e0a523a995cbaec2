//! API Router configuration

use super::handlers;
use super::middleware::edge_gate;
use super::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Router options taken from the server configuration
#[derive(Debug, Clone, Copy)]
pub struct RouterOptions {
    pub enable_cors: bool,
    pub max_body_size: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            enable_cors: true,
            max_body_size: 1024 * 1024,
        }
    }
}

/// Create the main router with default options
pub fn create_router(state: AppState) -> Router {
    create_router_with(state, RouterOptions::default())
}

/// Create the main router. The edge gate wraps every route, including the
/// page fallback.
pub fn create_router_with(state: AppState, options: RouterOptions) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(handlers::health_check))
        // Auth
        .route("/auth/me", get(handlers::current_principal))
        .route("/auth/onboarding", post(handlers::submit_onboarding))
        .route("/auth/webhook/clerk", post(handlers::receive_webhook))
        // Profiles
        .route("/profiles/:id", get(handlers::get_profile));

    let mut router = Router::new()
        .nest("/api", api_routes)
        .fallback(handlers::render_page)
        .layer(middleware::from_fn_with_state(state.clone(), edge_gate))
        .layer(DefaultBodyLimit::max(options.max_body_size))
        .layer(TraceLayer::new_for_http());

    if options.enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}
