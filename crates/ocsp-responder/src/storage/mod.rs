//! Revocation storage
//!
//! The responder only ever asks one question of its store: is this serial
//! revoked, and why. Two backends are provided:
//! - `MemoryStore`: hash map, for development and tests
//! - `PostgresStore`: the `revocations` table shared with the CA tooling

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{PostgresConnector, PostgresStore};

use async_trait::async_trait;
use ocsp_core::{RevocationRecord, Serial};
use std::fmt::Debug;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Serial not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

/// Revocation lookup backend
///
/// Implementations must be thread-safe and must not hold a global lock
/// across a lookup.
#[async_trait]
pub trait RevocationStore: Send + Sync + Debug {
    /// Look up a serial. `Ok(None)` and `Err(NotFound)` both mean the
    /// serial is not revoked.
    async fn lookup(&self, serial: &Serial) -> Result<Option<RevocationRecord>, StorageError>;

    /// Release connections held by the store
    async fn close(&self) -> Result<(), StorageError>;
}
