//! OCSP Responder
//!
//! Answers RFC 6960 certificate status queries for a single CA, signing
//! every answer with a delegated responder key. Revocation data comes from
//! a PostgreSQL table; status is one of good, revoked or unknown.
//!
//! The responder comes up in three steps (configuration, database,
//! listener), retrying each dependency until it is available.
//!
//! ## API Endpoints
//!
//! - `POST /` (any path) - DER-encoded OCSPRequest body
//! - `GET /{base64}` - base64 OCSPRequest in the path
//! - `GET /health` - Liveness check against the revocation store
//!
//! Responses are `application/ocsp-response`, cacheable until `nextUpdate`.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod core;
pub mod pidfile;
pub mod server;
pub mod service;
pub mod storage;

pub use api::{create_router, AppState};
pub use bootstrap::{
    Backoff, BootstrapError, BootstrapSequencer, BootstrapState, Bootstrapped, DatabaseConnector,
    HttpLauncher, RetryPolicy, ServiceLauncher,
};
pub use config::{ConfigError, ConfigProvider, PemFileConfig, ResponderConfig, SettingsFileConfig};
pub use crate::core::{IdentityHandle, RequestVerifier, ResponseBuilder};
pub use server::{Server, ServerError};
pub use service::{run_until_signalled, Worker};
pub use storage::{MemoryStore, PostgresConnector, PostgresStore, RevocationStore, StorageError};
