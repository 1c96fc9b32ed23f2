//! HTTP listener lifecycle
//!
//! The accept loop runs on its own task so that startup never blocks on
//! the listener. `stop` drains in-flight requests, then aborts after a
//! grace period.

use axum::Router;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {message}")]
    Bind { addr: String, message: String },

    #[error("Server task failed: {0}")]
    Task(String),
}

/// A running listener
#[derive(Debug)]
pub struct Server {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<io::Result<()>>,
}

impl Server {
    /// Bind `addr` and start serving `router` in the background
    pub async fn start(addr: &str, router: Router) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await.map_err(|e| ServerError::Bind {
            addr: addr.to_string(),
            message: e.to_string(),
        })?;
        let local_addr = listener.local_addr().map_err(|e| ServerError::Bind {
            addr: addr.to_string(),
            message: e.to_string(),
        })?;

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move { signal.cancelled().await })
                .await
        });

        info!(addr = %local_addr, "OCSP responder listening");

        Ok(Self {
            local_addr,
            shutdown,
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Close the listener and wait for in-flight requests
    pub async fn stop(self) -> Result<(), ServerError> {
        self.shutdown.cancel();

        let abort = self.task.abort_handle();
        match tokio::time::timeout(SHUTDOWN_GRACE, self.task).await {
            Ok(Ok(Ok(()))) => {
                info!(addr = %self.local_addr, "Listener closed");
                Ok(())
            }
            Ok(Ok(Err(e))) => {
                error!(error = %e, "Listener exited with error");
                Err(ServerError::Task(e.to_string()))
            }
            Ok(Err(e)) => Err(ServerError::Task(e.to_string())),
            Err(_) => {
                warn!(
                    grace_secs = SHUTDOWN_GRACE.as_secs(),
                    "Listener did not drain in time, aborting"
                );
                abort.abort();
                Ok(())
            }
        }
    }
}
