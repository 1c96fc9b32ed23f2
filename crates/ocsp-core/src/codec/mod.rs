//! OCSP codec boundary
//!
//! `OcspCodec` turns request bytes into an [`OcspRequest`] and a
//! [`ResponseTemplate`] into signed response bytes. `DerCodec` is the
//! RFC 6960 DER implementation.

pub mod asn1;

use der::asn1::{BitString, Null, OctetString};
use der::{Any, Decode, Encode, Tag, Tagged};
use std::fmt::Debug;
use tracing::debug;

use crate::crypto::{
    issuer_key_hash, issuer_name_hash, responder_key_hash, HashAlgorithm, ResponseSigner,
};
use crate::error::{OcspCoreError, Result};
use crate::time::to_generalized_time;
use crate::types::{CertificateStatus, OcspRequest, ResponseTemplate, Serial};

use asn1::{
    BasicOcspResponse, CertId, CertStatus, OcspResponse, OcspResponseStatus, ResponderId,
    ResponseBytes, ResponseData, RevokedInfo, SingleResponse, Version, ID_PKIX_OCSP_BASIC,
};

/// `OCSPResponse { responseStatus malformedRequest }`
pub const MALFORMED_REQUEST_RESPONSE: [u8; 5] = [0x30, 0x03, 0x0A, 0x01, 0x01];

/// `OCSPResponse { responseStatus internalError }`
pub const INTERNAL_ERROR_RESPONSE: [u8; 5] = [0x30, 0x03, 0x0A, 0x01, 0x02];

/// Request decoding and response encoding
pub trait OcspCodec: Send + Sync + Debug {
    /// Decode a DER request into its first CertID.
    ///
    /// Returns `MalformedEnvelope` when the bytes are not a single DER
    /// SEQUENCE, and `Decode`/`EmptyRequestList`/`UnsupportedHashAlgorithm`
    /// when the envelope is sound but the OCSP structure is not.
    fn decode_request(&self, der: &[u8]) -> Result<OcspRequest>;

    /// Encode and sign a successful response for `template`
    fn encode_response(
        &self,
        template: &ResponseTemplate,
        signer: &dyn ResponseSigner,
    ) -> Result<Vec<u8>>;
}

/// DER codec for RFC 6960 messages
#[derive(Debug, Clone, Copy, Default)]
pub struct DerCodec;

impl DerCodec {
    pub fn new() -> Self {
        Self
    }
}

impl OcspCodec for DerCodec {
    fn decode_request(&self, der: &[u8]) -> Result<OcspRequest> {
        check_envelope(der)?;

        let request = asn1::OcspRequest::from_der(der)
            .map_err(|e| OcspCoreError::Decode(e.to_string()))?;

        let count = request.tbs_request.request_list.len();
        if count > 1 {
            debug!(count, "OCSP request carries several CertIDs, answering the first");
        }

        let cert_id = request
            .tbs_request
            .request_list
            .into_iter()
            .next()
            .ok_or(OcspCoreError::EmptyRequestList)?
            .req_cert;

        Ok(OcspRequest {
            hash_algorithm: HashAlgorithm::from_oid(&cert_id.hash_algorithm.oid)?,
            issuer_name_hash: cert_id.issuer_name_hash.as_bytes().to_vec(),
            issuer_key_hash: cert_id.issuer_key_hash.as_bytes().to_vec(),
            serial_number: Serial::new(cert_id.serial_number),
        })
    }

    fn encode_response(
        &self,
        template: &ResponseTemplate,
        signer: &dyn ResponseSigner,
    ) -> Result<Vec<u8>> {
        let algorithm = template.hash_algorithm();
        let issuer = template.issuer_cert();

        let cert_id = CertId {
            hash_algorithm: algorithm.algorithm_identifier(),
            issuer_name_hash: octets(issuer_name_hash(issuer, algorithm)?)?,
            issuer_key_hash: octets(issuer_key_hash(issuer, algorithm))?,
            serial_number: template.serial_number().to_int()?,
        };

        let cert_status = match template.status() {
            CertificateStatus::Good => CertStatus::Good(Null),
            CertificateStatus::Revoked { reason, revoked_at } => CertStatus::Revoked(RevokedInfo {
                revocation_time: to_generalized_time(revoked_at)?,
                revocation_reason: Some(reason.into()),
            }),
            CertificateStatus::Unknown => CertStatus::Unknown(Null),
        };

        let this_update = to_generalized_time(template.this_update())?;
        let tbs_response_data = ResponseData {
            version: Version::V1,
            responder_id: ResponderId::ByKey(octets(responder_key_hash(
                template.responder_cert(),
            ))?),
            produced_at: this_update,
            responses: vec![SingleResponse {
                cert_id,
                cert_status,
                this_update,
                next_update: Some(to_generalized_time(template.next_update())?),
                single_extensions: None,
            }],
            response_extensions: None,
        };

        let tbs = tbs_response_data.to_der().map_err(encode_error)?;
        let signature = signer.sign(&tbs)?;

        let basic = BasicOcspResponse {
            tbs_response_data,
            signature_algorithm: signer.signature_algorithm(),
            signature: BitString::from_bytes(&signature).map_err(encode_error)?,
            certs: Some(vec![template.responder_cert().clone()]),
        };

        OcspResponse {
            response_status: OcspResponseStatus::Successful,
            response_bytes: Some(ResponseBytes {
                response_type: ID_PKIX_OCSP_BASIC,
                response: octets(basic.to_der().map_err(encode_error)?)?,
            }),
        }
        .to_der()
        .map_err(encode_error)
    }
}

/// Encode an unsuccessful `OCSPResponse` carrying only a status
pub fn encode_error_response(status: OcspResponseStatus) -> Result<Vec<u8>> {
    OcspResponse {
        response_status: status,
        response_bytes: None,
    }
    .to_der()
    .map_err(encode_error)
}

/// Decode a successful response down to its `BasicOCSPResponse`
pub fn decode_basic_response(der: &[u8]) -> Result<BasicOcspResponse> {
    let response = OcspResponse::from_der(der).map_err(|e| OcspCoreError::Decode(e.to_string()))?;
    let bytes = response.response_bytes.ok_or_else(|| {
        OcspCoreError::Decode(format!("response status {:?}", response.response_status))
    })?;
    if bytes.response_type != ID_PKIX_OCSP_BASIC {
        return Err(OcspCoreError::Decode(format!(
            "unexpected response type {}",
            bytes.response_type
        )));
    }
    BasicOcspResponse::from_der(bytes.response.as_bytes())
        .map_err(|e| OcspCoreError::Decode(e.to_string()))
}

/// Accept exactly one DER SEQUENCE TLV and nothing after it
fn check_envelope(der: &[u8]) -> Result<()> {
    let envelope =
        Any::from_der(der).map_err(|e| OcspCoreError::MalformedEnvelope(e.to_string()))?;
    if envelope.tag() != Tag::Sequence {
        return Err(OcspCoreError::MalformedEnvelope(format!(
            "expected SEQUENCE, found {}",
            envelope.tag()
        )));
    }
    Ok(())
}

fn octets(bytes: Vec<u8>) -> Result<OctetString> {
    OctetString::new(bytes).map_err(encode_error)
}

fn encode_error(err: der::Error) -> OcspCoreError {
    OcspCoreError::Encode(err.to_string())
}
