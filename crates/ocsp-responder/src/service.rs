//! Process lifecycle
//!
//! `Worker` owns the bootstrap task and everything it produces. It exposes
//! start/stop hooks; `run_until_signalled` is the thin platform adapter
//! that maps OS signals onto them.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::bootstrap::{BootstrapError, BootstrapSequencer, BootstrapState, Bootstrapped};
use crate::config::{load_config, ConfigError, ConfigProvider};
use crate::core::IdentityHandle;

#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("Cannot reload before serving (state: {0})")]
    NotServing(BootstrapState),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug)]
pub struct Worker {
    cancel: CancellationToken,
    failed: CancellationToken,
    state: watch::Receiver<BootstrapState>,
    identity: IdentityHandle,
    config: Arc<dyn ConfigProvider>,
    task: JoinHandle<Result<Bootstrapped, BootstrapError>>,
}

impl Worker {
    /// Spawn the bootstrap sequence. Returns immediately.
    pub fn start(sequencer: BootstrapSequencer) -> Self {
        let cancel = CancellationToken::new();
        let failed = CancellationToken::new();
        let state = sequencer.subscribe();
        let identity = sequencer.identity();
        let config = sequencer.config_provider();

        let run_cancel = cancel.clone();
        let run_failed = failed.clone();
        let task = tokio::spawn(async move {
            let outcome = sequencer.run(run_cancel).await;
            if let Err(BootstrapError::Launch(e)) = &outcome {
                error!(error = %e, "Responder failed to start");
                run_failed.cancel();
            }
            outcome
        });

        Self {
            cancel,
            failed,
            state,
            identity,
            config,
            task,
        }
    }

    pub fn state(&self) -> BootstrapState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<BootstrapState> {
        self.state.clone()
    }

    pub fn identity(&self) -> IdentityHandle {
        self.identity.clone()
    }

    /// Fires when bootstrap ends in an unrecoverable error
    pub fn failure(&self) -> CancellationToken {
        self.failed.clone()
    }

    /// Re-read configuration and swap in the new identity.
    ///
    /// On failure the current identity stays in effect.
    pub async fn reload_identity(&self) -> Result<(), ReloadError> {
        let state = self.state();
        if state != BootstrapState::Serving {
            return Err(ReloadError::NotServing(state));
        }

        let loaded = load_config(self.config.clone()).await?;
        self.identity.replace(loaded.identity);
        info!("Responder identity reloaded");
        Ok(())
    }

    /// Shut down: cancel pending retries, close the store, close the
    /// listener. Each step is attempted even when an earlier one fails.
    pub async fn stop(self) -> Result<(), BootstrapError> {
        info!(state = %self.state(), "Stopping responder");
        self.cancel.cancel();

        let bootstrapped = match self.task.await {
            Ok(Ok(bootstrapped)) => bootstrapped,
            Ok(Err(BootstrapError::Cancelled(state))) => {
                info!(%state, "Bootstrap cancelled");
                return Ok(());
            }
            Ok(Err(e)) => return Err(e),
            Err(e) => {
                error!(error = %e, "Bootstrap task panicked");
                return Ok(());
            }
        };

        if let Err(e) = bootstrapped.store.close().await {
            warn!(error = %e, "Failed to close revocation store");
        }

        if let Err(e) = bootstrapped.server.stop().await {
            warn!(error = %e, "Failed to stop listener");
        }

        info!("Responder stopped");
        Ok(())
    }
}

/// Run `worker` until a termination signal arrives.
///
/// SIGTERM and SIGINT stop the worker; SIGHUP reloads the identity.
#[cfg(unix)]
pub async fn run_until_signalled(worker: Worker) -> Result<(), BootstrapError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate()).map_err(signal_error)?;
    let mut interrupt = signal(SignalKind::interrupt()).map_err(signal_error)?;
    let mut hangup = signal(SignalKind::hangup()).map_err(signal_error)?;
    let failed = worker.failure();

    loop {
        tokio::select! {
            _ = terminate.recv() => {
                info!("Received SIGTERM");
                break;
            }
            _ = interrupt.recv() => {
                info!("Received SIGINT");
                break;
            }
            _ = hangup.recv() => {
                if let Err(e) = worker.reload_identity().await {
                    warn!(error = %e, "Identity reload failed");
                }
            }
            _ = failed.cancelled() => break,
        }
    }

    worker.stop().await
}

#[cfg(not(unix))]
pub async fn run_until_signalled(worker: Worker) -> Result<(), BootstrapError> {
    let failed = worker.failure();
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for ctrl-c");
            }
        }
        _ = failed.cancelled() => {}
    }
    worker.stop().await
}

#[cfg(unix)]
fn signal_error(e: std::io::Error) -> BootstrapError {
    BootstrapError::Signal(e.to_string())
}
