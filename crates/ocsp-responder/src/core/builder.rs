//! Response construction
//!
//! Applies the status policy against the revocation store, stamps the
//! hour-quantized validity window and hands the template to the codec for
//! signing.

use chrono::{DateTime, Utc};
use ocsp_core::time::{http_date, validity_window};
use ocsp_core::{
    CertificateStatus, Clock, OcspCodec, OcspCoreError, OcspRequest, ResponderIdentity,
    ResponseTemplate, Serial,
};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::storage::{RevocationStore, StorageError};

/// `Cache-Control` sent with every signed response
pub const CACHE_CONTROL: &str = "max-age=0, public, no-transform, must-revalidate";

/// Response construction failures. All surface as `internalError`.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Validity window or template could not be formed
    #[error("Invalid response template: {0}")]
    Template(OcspCoreError),

    /// Encoding or signing failed
    #[error("Failed to sign response: {0}")]
    Signing(OcspCoreError),
}

/// A signed response together with the template it was built from
#[derive(Debug, Clone)]
pub struct BuiltResponse {
    pub template: ResponseTemplate,
    pub bytes: Vec<u8>,
}

impl BuiltResponse {
    /// Quoted uppercase hex SHA-256 of the signed bytes
    pub fn etag(&self) -> String {
        format!("\"{}\"", hex::encode_upper(Sha256::digest(&self.bytes)))
    }

    pub fn last_modified(&self) -> String {
        http_date(self.template.this_update())
    }

    pub fn expires(&self) -> String {
        http_date(self.template.next_update())
    }
}

/// Builds signed responses. Holds no mutable state.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    codec: Arc<dyn OcspCodec>,
    clock: Arc<dyn Clock>,
}

impl ResponseBuilder {
    pub fn new(codec: Arc<dyn OcspCodec>, clock: Arc<dyn Clock>) -> Self {
        Self { codec, clock }
    }

    /// Look up the serial, fill a template and sign it
    pub async fn build(
        &self,
        request: &OcspRequest,
        identity: &ResponderIdentity,
        store: &dyn RevocationStore,
    ) -> Result<BuiltResponse, BuildError> {
        let now = self.clock.now();
        let (this_update, next_update) = validity_window(now).map_err(BuildError::Template)?;

        let status = resolve_status(&request.serial_number, now, store).await;

        let template = ResponseTemplate::new(
            request,
            status,
            this_update,
            next_update,
            identity.ca_cert().clone(),
            identity.responder_cert().clone(),
        )
        .map_err(BuildError::Template)?;

        let bytes = self
            .codec
            .encode_response(&template, identity.signer())
            .map_err(|e| {
                error!(serial = %request.serial_number, error = %e, "Failed to sign OCSP response");
                BuildError::Signing(e)
            })?;

        debug!(
            serial = %request.serial_number,
            status = status.label(),
            this_update = %this_update,
            "Built OCSP response"
        );

        Ok(BuiltResponse { template, bytes })
    }
}

/// Status policy:
/// - store error other than not-found: `Unknown`, logged
/// - not found: `Good`
/// - found: `Revoked` with the stored reason, dated `now`
pub async fn resolve_status(
    serial: &Serial,
    now: DateTime<Utc>,
    store: &dyn RevocationStore,
) -> CertificateStatus {
    match store.lookup(serial).await {
        Ok(None) | Err(StorageError::NotFound(_)) => CertificateStatus::Good,
        Ok(Some(record)) => {
            info!(serial = %serial, reason = %record.reason, "Serial is revoked");
            CertificateStatus::Revoked {
                reason: record.reason,
                revoked_at: now,
            }
        }
        Err(e) => {
            error!(serial = %serial, error = %e, "Revocation lookup failed, answering unknown");
            CertificateStatus::Unknown
        }
    }
}
