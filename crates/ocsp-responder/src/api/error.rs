//! OCSP error responses
//!
//! Failures are answered with a bare `OCSPResponse` carrying only a status:
//! `30 03 0A 01 01` (malformedRequest) or `30 03 0A 01 02` (internalError).

use axum::{
    extract::rejection::{BytesRejection, PathRejection},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use ocsp_core::{INTERNAL_ERROR_RESPONSE, MALFORMED_REQUEST_RESPONSE};
use thiserror::Error;

use crate::core::{BuildError, VerifyError};

/// Errors surfaced to OCSP clients
#[derive(Error, Debug)]
pub enum OcspError {
    /// Unreadable body or bad base64: malformedRequest, HTTP 400
    #[error("Malformed request: {0}")]
    BadRequest(String),

    /// Request names another issuer: malformedRequest, HTTP 500
    #[error("Issuer mismatch: {0}")]
    IssuerMismatch(String),

    /// Codec, signing or state failure: internalError, HTTP 500
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcspError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            OcspError::BadRequest(_) => StatusCode::BAD_REQUEST,
            OcspError::IssuerMismatch(_) | OcspError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Exact DER bytes of the error response
    pub fn body(&self) -> &'static [u8] {
        match self {
            OcspError::BadRequest(_) | OcspError::IssuerMismatch(_) => &MALFORMED_REQUEST_RESPONSE,
            OcspError::Internal(_) => &INTERNAL_ERROR_RESPONSE,
        }
    }
}

impl IntoResponse for OcspError {
    fn into_response(self) -> Response {
        tracing::debug!(error = %self, "Answering with OCSP error");
        (
            self.status_code(),
            [(header::CONTENT_TYPE, "application/ocsp-response")],
            self.body(),
        )
            .into_response()
    }
}

impl From<VerifyError> for OcspError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::InvalidEncoding(_) | VerifyError::MalformedEnvelope(_) => {
                OcspError::BadRequest(err.to_string())
            }
            VerifyError::IssuerNameMismatch | VerifyError::IssuerKeyMismatch => {
                OcspError::IssuerMismatch(err.to_string())
            }
            VerifyError::Undecodable(_) | VerifyError::IssuerDigest(_) => {
                OcspError::Internal(err.to_string())
            }
        }
    }
}

impl From<BuildError> for OcspError {
    fn from(err: BuildError) -> Self {
        OcspError::Internal(err.to_string())
    }
}

impl From<BytesRejection> for OcspError {
    fn from(err: BytesRejection) -> Self {
        OcspError::BadRequest(err.to_string())
    }
}

impl From<PathRejection> for OcspError {
    fn from(err: PathRejection) -> Self {
        OcspError::BadRequest(err.to_string())
    }
}
