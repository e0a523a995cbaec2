//! Server setup and lifecycle management

use crate::api::rest::router::{create_router_with, RouterOptions};
use crate::api::rest::state::AppState;
use crate::config::{DaemonConfig, StorageConfig};
use crate::error::{DaemonError, DaemonResult};
use crate::storage::{InMemoryProfileStore, PostgresProfileStore, ProfileStore};
use heal_access::EdgePolicy;
use heal_identity::{IdentityProvider, LocalIdentityProvider, WebhookVerifier};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Heal daemon server
pub struct Server {
    config: DaemonConfig,
    state: AppState,
}

impl Server {
    /// Create a new server with the given configuration
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let profiles: Arc<dyn ProfileStore> = match &config.storage {
            StorageConfig::Memory => {
                tracing::info!("Using in-memory profile store");
                Arc::new(InMemoryProfileStore::new())
            }
            StorageConfig::Postgres {
                url,
                max_connections,
                connect_timeout_secs,
            } => {
                tracing::info!("Connecting to PostgreSQL profile store");
                Arc::new(PostgresProfileStore::new(url, *max_connections, *connect_timeout_secs).await?)
            }
        };

        let issuer = config.identity.session_issuer()?;
        let provider: Arc<dyn IdentityProvider> = Arc::new(LocalIdentityProvider::new(issuer));

        let mut state = AppState::new(provider, profiles).with_edge_policy(EdgePolicy {
            enforce_roles: config.access.enforce_roles_at_edge,
        });

        match config.identity.admin_code() {
            Some(code) => state = state.with_admin_code(code),
            None => tracing::warn!("No admin code configured, admin onboarding is closed"),
        }

        match config.identity.webhook_secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => {
                let verifier = WebhookVerifier::new(secret)
                    .map_err(|e| DaemonError::Config(e.to_string()))?;
                state = state.with_webhook(verifier);
            }
            None => tracing::warn!("No webhook secret configured, webhook deliveries will be refused"),
        }

        state
            .routes
            .validate()
            .map_err(|e| DaemonError::Config(e.to_string()))?;

        Ok(Self { config, state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;

        let app = create_router_with(
            self.state,
            RouterOptions {
                enable_cors: self.config.server.enable_cors,
                max_body_size: self.config.server.max_body_size,
            },
        );

        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Heal daemon listening on {}", addr);
        tracing::info!(
            enforce_roles_at_edge = self.config.access.enforce_roles_at_edge,
            "Edge gate configured"
        );

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Heal daemon shutting down");
        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
