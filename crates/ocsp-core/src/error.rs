//! Error types for the OCSP core library

use thiserror::Error;

/// Result type alias using OcspCoreError
pub type Result<T> = std::result::Result<T, OcspCoreError>;

/// Errors raised while decoding requests, encoding responses or loading
/// responder material
#[derive(Error, Debug)]
pub enum OcspCoreError {
    /// The request body is not a single well-formed DER TLV
    #[error("Malformed DER envelope: {0}")]
    MalformedEnvelope(String),

    /// The DER envelope could not be decoded as an OCSP request
    #[error("Failed to decode OCSP request: {0}")]
    Decode(String),

    /// The request carries no single requests
    #[error("OCSP request contains no certificate ids")]
    EmptyRequestList,

    /// The CertID hash algorithm is not one we can recompute
    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedHashAlgorithm(String),

    /// A response structure could not be DER-encoded
    #[error("Failed to encode OCSP response: {0}")]
    Encode(String),

    /// The signing primitive rejected the input
    #[error("Signing failed: {0}")]
    Signing(String),

    /// A timestamp cannot be represented in the response
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    /// A response template violates its invariants
    #[error("Invalid response template: {0}")]
    InvalidTemplate(String),

    /// Certificate could not be parsed
    #[error("Invalid certificate: {0}")]
    Certificate(String),

    /// Private key could not be parsed
    #[error("Invalid private key: {0}")]
    PrivateKey(String),

    /// Reading responder material from disk failed
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
}
