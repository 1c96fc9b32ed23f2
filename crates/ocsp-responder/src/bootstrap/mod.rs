//! Resilient bootstrap
//!
//! Brings the responder online even when the configuration source or the
//! database is not available yet. The sequencer walks
//! `AwaitingConfig -> AwaitingDatabase -> Serving`, retrying each
//! dependency on its own fixed interval, and never moves backwards.
//!
//! The loaded identity is published through an `IdentityHandle` before the
//! listener starts, so the first request already sees it.

pub mod retry;

pub use retry::{retry, Backoff, Cancelled};

use async_trait::async_trait;
use ocsp_core::{Clock, OcspCodec};
use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::config::{load_config, ConfigProvider};
use crate::core::IdentityHandle;
use crate::server::{Server, ServerError};
use crate::storage::{RevocationStore, StorageError};

/// Bootstrap progress. Ordering follows the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BootstrapState {
    AwaitingConfig,
    AwaitingDatabase,
    Serving,
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingConfig => write!(f, "awaiting-config"),
            Self::AwaitingDatabase => write!(f, "awaiting-database"),
            Self::Serving => write!(f, "serving"),
        }
    }
}

/// Opens the revocation store once a database URL is known
#[async_trait]
pub trait DatabaseConnector: Send + Sync + Debug {
    async fn connect(&self, database_url: &str) -> Result<Arc<dyn RevocationStore>, StorageError>;
}

/// Starts the listener once identity and store are ready
#[async_trait]
pub trait ServiceLauncher: Send + Sync + Debug {
    async fn launch(
        &self,
        port: u16,
        identity: IdentityHandle,
        store: Arc<dyn RevocationStore>,
    ) -> Result<Server, ServerError>;
}

/// Serves the OCSP router over HTTP
#[derive(Debug, Clone)]
pub struct HttpLauncher {
    host: String,
    codec: Arc<dyn OcspCodec>,
    clock: Arc<dyn Clock>,
}

impl HttpLauncher {
    pub fn new(host: impl Into<String>, codec: Arc<dyn OcspCodec>, clock: Arc<dyn Clock>) -> Self {
        Self {
            host: host.into(),
            codec,
            clock,
        }
    }
}

#[async_trait]
impl ServiceLauncher for HttpLauncher {
    async fn launch(
        &self,
        port: u16,
        identity: IdentityHandle,
        store: Arc<dyn RevocationStore>,
    ) -> Result<Server, ServerError> {
        let state = Arc::new(AppState::new(
            identity,
            store,
            self.codec.clone(),
            self.clock.clone(),
        ));
        let addr = format!("{}:{}", self.host, port);
        Server::start(&addr, create_router(state)).await
    }
}

/// Retry intervals for each dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub config: Backoff,
    pub database: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            config: Backoff::Fixed(Duration::from_secs(60)),
            database: Backoff::Fixed(Duration::from_secs(30)),
        }
    }
}

impl RetryPolicy {
    /// Zero-delay retries, for tests
    pub const fn immediate() -> Self {
        Self {
            config: Backoff::immediate(),
            database: Backoff::immediate(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Bootstrap cancelled while {0}")]
    Cancelled(BootstrapState),

    #[error("Failed to start listener: {0}")]
    Launch(#[from] ServerError),

    #[error("Failed to install signal handler: {0}")]
    Signal(String),
}

/// Everything a successful bootstrap produced
#[derive(Debug)]
pub struct Bootstrapped {
    pub server: Server,
    pub store: Arc<dyn RevocationStore>,
    pub identity: IdentityHandle,
}

pub struct BootstrapSequencer {
    config: Arc<dyn ConfigProvider>,
    connector: Arc<dyn DatabaseConnector>,
    launcher: Arc<dyn ServiceLauncher>,
    policy: RetryPolicy,
    identity: IdentityHandle,
    state: watch::Sender<BootstrapState>,
}

impl Debug for BootstrapSequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapSequencer")
            .field("config", &self.config)
            .field("connector", &self.connector)
            .field("launcher", &self.launcher)
            .field("policy", &self.policy)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl BootstrapSequencer {
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        connector: Arc<dyn DatabaseConnector>,
        launcher: Arc<dyn ServiceLauncher>,
    ) -> Self {
        let (state, _) = watch::channel(BootstrapState::AwaitingConfig);
        Self {
            config,
            connector,
            launcher,
            policy: RetryPolicy::default(),
            identity: IdentityHandle::new(),
            state,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Handle the identity is published through
    pub fn identity(&self) -> IdentityHandle {
        self.identity.clone()
    }

    pub fn config_provider(&self) -> Arc<dyn ConfigProvider> {
        self.config.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BootstrapState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> BootstrapState {
        *self.state.borrow()
    }

    /// Drive the sequence to `Serving`.
    ///
    /// Config and database failures are retried until `cancel` fires. Only
    /// a listener failure ends the sequence with an error.
    pub async fn run(self, cancel: CancellationToken) -> Result<Bootstrapped, BootstrapError> {
        info!(state = %self.state(), "Starting bootstrap");

        let config = self.config.clone();
        let (loaded, attempts) = retry("load-config", self.policy.config, &cancel, || {
            let config = config.clone();
            async move { load_config(config).await }
        })
        .await
        .map_err(|_| BootstrapError::Cancelled(BootstrapState::AwaitingConfig))?;

        info!(attempts, port = loaded.port, "Configuration loaded");
        self.identity.replace(loaded.identity);
        self.advance(BootstrapState::AwaitingDatabase);

        let connector = self.connector.clone();
        let database_url = loaded.database_url;
        let (store, attempts) = retry("connect-database", self.policy.database, &cancel, || {
            let connector = connector.clone();
            let database_url = database_url.clone();
            async move { connector.connect(&database_url).await }
        })
        .await
        .map_err(|_| BootstrapError::Cancelled(BootstrapState::AwaitingDatabase))?;

        info!(attempts, "Database connected");

        if cancel.is_cancelled() {
            close_quietly(store.as_ref()).await;
            return Err(BootstrapError::Cancelled(BootstrapState::AwaitingDatabase));
        }

        let server = match self
            .launcher
            .launch(loaded.port, self.identity.clone(), store.clone())
            .await
        {
            Ok(server) => server,
            Err(e) => {
                close_quietly(store.as_ref()).await;
                return Err(e.into());
            }
        };

        self.advance(BootstrapState::Serving);

        Ok(Bootstrapped {
            server,
            store,
            identity: self.identity,
        })
    }

    fn advance(&self, next: BootstrapState) {
        let moved = self.state.send_if_modified(|current| {
            if next > *current {
                *current = next;
                true
            } else {
                false
            }
        });
        if moved {
            info!(state = %next, "Bootstrap state changed");
        }
    }
}

async fn close_quietly(store: &dyn RevocationStore) {
    if let Err(e) = store.close().await {
        warn!(error = %e, "Failed to close revocation store");
    }
}
