//! # OCSP Core
//!
//! Protocol-level building blocks for an RFC 6960 OCSP responder.
//!
//! ## Key Concepts
//!
//! - **CertID**: identifies a certificate by issuer name hash, issuer key
//!   hash and serial number
//! - **Issuer binding**: the name/key hashes must match the CA this
//!   responder serves
//! - **Response template**: status plus validity window, encoded and signed
//!   by an [`OcspCodec`]
//! - **Responder identity**: CA certificate, delegated responder
//!   certificate and its private key

pub mod codec;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod time;
pub mod types;

pub use codec::{DerCodec, OcspCodec, INTERNAL_ERROR_RESPONSE, MALFORMED_REQUEST_RESPONSE};
pub use crypto::{HashAlgorithm, ResponseSigner, RsaResponseSigner};
pub use error::{OcspCoreError, Result};
pub use identity::ResponderIdentity;
pub use time::{Clock, FixedClock, SystemClock};
pub use types::{
    CertificateStatus, OcspRequest, ResponseTemplate, RevocationReason, RevocationRecord, Serial,
};
