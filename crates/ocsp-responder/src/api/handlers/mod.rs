//! Request handlers

pub mod ocsp;

pub use ocsp::{ocsp_get, ocsp_get_root, ocsp_post};

use ocsp_core::{Clock, OcspCodec};
use std::sync::Arc;

use crate::core::{IdentityHandle, RequestVerifier, ResponseBuilder};
use crate::storage::RevocationStore;

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub identity: IdentityHandle,
    pub store: Arc<dyn RevocationStore>,
    pub verifier: RequestVerifier,
    pub builder: ResponseBuilder,
}

impl AppState {
    pub fn new(
        identity: IdentityHandle,
        store: Arc<dyn RevocationStore>,
        codec: Arc<dyn OcspCodec>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identity,
            store,
            verifier: RequestVerifier::new(codec.clone()),
            builder: ResponseBuilder::new(codec, clock),
        }
    }
}
