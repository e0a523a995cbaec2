//! Heal daemon library
//!
//! The HTTP service in front of the Heal portal:
//! - Edge gate middleware on every request
//! - Auth endpoints: current principal, onboarding, identity webhooks
//! - Profile mirror storage (memory or PostgreSQL)
//! - Server lifecycle management

#![deny(unsafe_code)]

pub mod api;
pub mod config;
pub mod error;
pub mod server;
pub mod storage;

pub use api::rest::{AppState, CurrentSession};
pub use api::create_router;
pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError, StorageError};
pub use server::Server;
pub use storage::{InMemoryProfileStore, PostgresProfileStore, ProfileStore};
