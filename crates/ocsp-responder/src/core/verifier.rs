//! Inbound request verification
//!
//! Turns POST bodies and GET path segments into decoded requests and checks
//! that each request targets the CA this responder serves.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use ocsp_core::crypto::{issuer_key_hash, issuer_name_hash};
use ocsp_core::{OcspCodec, OcspCoreError, OcspRequest};
use std::borrow::Cow;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;
use x509_cert::Certificate;

/// Where the request bytes came from
#[derive(Debug, Clone, Copy)]
pub enum RequestSource<'a> {
    /// Raw DER body
    Post(&'a [u8]),
    /// Base64 request, as found in the URL path
    Get(&'a str),
}

/// Verification failures
#[derive(Debug, Error)]
pub enum VerifyError {
    /// GET path is not valid base64
    #[error("Invalid base64 request: {0}")]
    InvalidEncoding(String),

    /// Bytes are not a DER SEQUENCE at all
    #[error("Malformed request envelope: {0}")]
    MalformedEnvelope(String),

    /// Envelope is sound but is not an OCSP request we can answer
    #[error("Cannot decode OCSP request: {0}")]
    Undecodable(OcspCoreError),

    #[error("Issuer name hash does not match this CA")]
    IssuerNameMismatch,

    #[error("Issuer key hash does not match this CA")]
    IssuerKeyMismatch,

    /// The CA subject could not be re-encoded for hashing
    #[error("Cannot compute issuer digest: {0}")]
    IssuerDigest(OcspCoreError),
}

/// Decodes requests and authenticates their issuer binding.
///
/// Holds no mutable state.
#[derive(Debug, Clone)]
pub struct RequestVerifier {
    codec: Arc<dyn OcspCodec>,
}

impl RequestVerifier {
    pub fn new(codec: Arc<dyn OcspCodec>) -> Self {
        Self { codec }
    }

    /// Decode `source` and check it against `ca_cert`
    pub fn verify(
        &self,
        source: RequestSource<'_>,
        ca_cert: &Certificate,
    ) -> Result<OcspRequest, VerifyError> {
        let der: Cow<'_, [u8]> = match source {
            RequestSource::Post(body) => Cow::Borrowed(body),
            RequestSource::Get(path) => Cow::Owned(decode_get_path(path)?),
        };

        let request = self.codec.decode_request(&der).map_err(|e| match e {
            OcspCoreError::MalformedEnvelope(msg) => VerifyError::MalformedEnvelope(msg),
            other => VerifyError::Undecodable(other),
        })?;

        verify_issuer(&request, ca_cert)?;
        Ok(request)
    }
}

/// Decode the base64 request carried in a GET path.
///
/// The router has already percent-decoded the segment. Standard base64 is
/// tried first, then the URL-safe alphabet, each with and without padding.
pub fn decode_get_path(path: &str) -> Result<Vec<u8>, VerifyError> {
    let encoded = path.trim_start_matches('/');

    let mut last_error = None;
    for engine in [&STANDARD, &URL_SAFE, &STANDARD_NO_PAD, &URL_SAFE_NO_PAD] {
        match engine.decode(encoded) {
            Ok(bytes) => return Ok(bytes),
            Err(e) => last_error = Some(e),
        }
    }

    Err(VerifyError::InvalidEncoding(
        last_error.map(|e| e.to_string()).unwrap_or_default(),
    ))
}

/// Recompute the CA name and key digests with the request's algorithm and
/// compare them to the CertID.
pub fn verify_issuer(request: &OcspRequest, ca_cert: &Certificate) -> Result<(), VerifyError> {
    let algorithm = request.hash_algorithm;

    let name_hash = issuer_name_hash(ca_cert, algorithm).map_err(VerifyError::IssuerDigest)?;
    if name_hash != request.issuer_name_hash {
        warn!(
            serial = %request.serial_number,
            algorithm = %algorithm,
            "Issuer name hash mismatch"
        );
        return Err(VerifyError::IssuerNameMismatch);
    }

    if issuer_key_hash(ca_cert, algorithm) != request.issuer_key_hash {
        warn!(
            serial = %request.serial_number,
            algorithm = %algorithm,
            "Issuer key hash mismatch"
        );
        return Err(VerifyError::IssuerKeyMismatch);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::DecodePem;
    use ocsp_core::{DerCodec, HashAlgorithm, Serial};

    const CA_PEM: &str = include_str!("../../../../testdata/ca.pem");
    const OTHER_CA_PEM: &str = include_str!("../../../../testdata/other-ca.pem");
    const REQ_SHA1: &[u8] = include_bytes!("../../../../testdata/req-sha1-1001.der");
    const REQ_OTHER_CA: &[u8] = include_bytes!("../../../../testdata/req-other-ca.der");

    fn ca() -> Certificate {
        Certificate::from_pem(CA_PEM).unwrap()
    }

    fn verifier() -> RequestVerifier {
        RequestVerifier::new(Arc::new(DerCodec))
    }

    #[test]
    fn test_post_request_verifies() {
        let request = verifier()
            .verify(RequestSource::Post(REQ_SHA1), &ca())
            .unwrap();
        assert_eq!(request.serial_number, Serial::from(0x1001));
    }

    #[test]
    fn test_get_request_verifies() {
        let encoded = STANDARD.encode(REQ_SHA1);
        let path = format!("/{}", encoded);
        let request = verifier()
            .verify(RequestSource::Get(&path), &ca())
            .unwrap();
        assert_eq!(request.hash_algorithm, HashAlgorithm::Sha1);
    }

    #[test]
    fn test_url_safe_get_accepted() {
        let encoded = URL_SAFE_NO_PAD.encode(REQ_SHA1);
        assert_eq!(decode_get_path(&encoded).unwrap(), REQ_SHA1);
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let err = decode_get_path("/%%%not-base64%%%").unwrap_err();
        assert!(matches!(err, VerifyError::InvalidEncoding(_)));
    }

    #[test]
    fn test_other_issuer_rejected() {
        let err = verifier()
            .verify(RequestSource::Post(REQ_OTHER_CA), &ca())
            .unwrap_err();
        assert!(matches!(err, VerifyError::IssuerNameMismatch));
    }

    #[test]
    fn test_key_mismatch_detected() {
        let mut request = DerCodec.decode_request(REQ_SHA1).unwrap();
        request.issuer_key_hash[0] ^= 0xFF;
        let err = verify_issuer(&request, &ca()).unwrap_err();
        assert!(matches!(err, VerifyError::IssuerKeyMismatch));
    }

    #[test]
    fn test_request_verifies_against_its_own_ca_only() {
        let other = Certificate::from_pem(OTHER_CA_PEM).unwrap();
        assert!(verifier()
            .verify(RequestSource::Post(REQ_OTHER_CA), &other)
            .is_ok());
        assert!(verifier()
            .verify(RequestSource::Post(REQ_SHA1), &other)
            .is_err());
    }

    #[test]
    fn test_garbage_is_malformed_envelope() {
        let err = verifier()
            .verify(RequestSource::Post(b"hello"), &ca())
            .unwrap_err();
        assert!(matches!(err, VerifyError::MalformedEnvelope(_)));
    }

    #[test]
    fn test_wrong_structure_is_undecodable() {
        let err = verifier()
            .verify(RequestSource::Post(&[0x30, 0x03, 0x02, 0x01, 0x05]), &ca())
            .unwrap_err();
        assert!(matches!(err, VerifyError::Undecodable(_)));
    }
}
