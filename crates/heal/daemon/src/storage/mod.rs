//! Storage layer for heal-daemon
//!
//! Holds the denormalized user profile mirror written by the webhook relay.

mod memory;
mod postgres;
mod traits;

pub use memory::InMemoryProfileStore;
pub use postgres::PostgresProfileStore;
pub use traits::{ProfileStore, StorageResult};
