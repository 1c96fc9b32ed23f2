//! Codec Tests
//!
//! These tests run the DER codec against requests produced by openssl:
//! - CertID extraction and hash algorithm detection
//! - Issuer digests recomputed from the CA certificate
//! - Response structure, validity window and signature

use chrono::{Duration, TimeZone, Utc};
use der::asn1::{ObjectIdentifier, OctetString};
use der::{Any, Encode};
use ocsp_core::codec::asn1::{
    CertId, CertStatus, OcspRequest as Asn1Request, Request, ResponderId, TbsRequest, Version,
};
use ocsp_core::codec::decode_basic_response;
use ocsp_core::crypto::{issuer_key_hash, issuer_name_hash, responder_key_hash};
use ocsp_core::time::from_generalized_time;
use ocsp_core::{
    CertificateStatus, DerCodec, HashAlgorithm, OcspCodec, OcspCoreError, OcspRequest,
    ResponderIdentity, ResponseTemplate, RevocationReason, Serial,
};
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use sha2::Sha256;
use spki::AlgorithmIdentifierOwned;

const CA_PEM: &str = include_str!("../../../testdata/ca.pem");
const OTHER_CA_PEM: &str = include_str!("../../../testdata/other-ca.pem");
const RESPONDER_PEM: &str = include_str!("../../../testdata/responder.pem");
const RESPONDER_KEY: &str = include_str!("../../../testdata/responder.key");

const REQ_SHA1: &[u8] = include_bytes!("../../../testdata/req-sha1-1001.der");
const REQ_SHA256: &[u8] = include_bytes!("../../../testdata/req-sha256-1001.der");
const REQ_NONCE: &[u8] = include_bytes!("../../../testdata/req-nonce-1001.der");
const REQ_OTHER_CA: &[u8] = include_bytes!("../../../testdata/req-other-ca.der");

// =============================================================================
// Test Helpers
// =============================================================================

fn identity() -> ResponderIdentity {
    ResponderIdentity::from_pem(CA_PEM, RESPONDER_PEM, RESPONDER_KEY).expect("fixture identity")
}

fn template_for(status: CertificateStatus) -> ResponseTemplate {
    let identity = identity();
    let request = DerCodec.decode_request(REQ_SHA1).unwrap();
    let this_update = Utc.with_ymd_and_hms(2030, 5, 17, 9, 0, 0).unwrap();
    ResponseTemplate::new(
        &request,
        status,
        this_update,
        this_update + Duration::days(1),
        identity.ca_cert().clone(),
        identity.responder_cert().clone(),
    )
    .unwrap()
}

fn cert_id_with(algorithm: ObjectIdentifier) -> CertId {
    CertId {
        hash_algorithm: AlgorithmIdentifierOwned {
            oid: algorithm,
            parameters: Some(Any::null()),
        },
        issuer_name_hash: OctetString::new(vec![0u8; 20]).unwrap(),
        issuer_key_hash: OctetString::new(vec![0u8; 20]).unwrap(),
        serial_number: Serial::from(7).to_int().unwrap(),
    }
}

fn request_der(requests: Vec<Request>) -> Vec<u8> {
    Asn1Request {
        tbs_request: TbsRequest {
            version: Version::V1,
            requestor_name: None,
            request_list: requests,
            request_extensions: None,
        },
        optional_signature: None,
    }
    .to_der()
    .unwrap()
}

// =============================================================================
// Request Decoding
// =============================================================================

#[test]
fn test_decode_sha1_request() {
    let request = DerCodec.decode_request(REQ_SHA1).unwrap();

    assert_eq!(request.hash_algorithm, HashAlgorithm::Sha1);
    assert_eq!(request.serial_number.to_i64(), Some(0x1001));
    assert_eq!(
        hex::encode_upper(&request.issuer_name_hash),
        "AE874CF318B4BBB418C72F920D53B27F5D7433E6"
    );
    assert_eq!(
        hex::encode_upper(&request.issuer_key_hash),
        "B289CA1A8B8259D03EE4FC719A6609B07CFB3FEA"
    );
}

#[test]
fn test_decode_sha256_request() {
    let request = DerCodec.decode_request(REQ_SHA256).unwrap();

    assert_eq!(request.hash_algorithm, HashAlgorithm::Sha256);
    assert_eq!(request.issuer_name_hash.len(), 32);
    assert_eq!(request.serial_number, Serial::from(0x1001));
}

#[test]
fn test_decode_ignores_request_extensions() {
    let with_nonce = DerCodec.decode_request(REQ_NONCE).unwrap();
    let without = DerCodec.decode_request(REQ_SHA1).unwrap();
    assert_eq!(with_nonce, without);
}

#[test]
fn test_empty_request_list_rejected() {
    let err = DerCodec.decode_request(&request_der(vec![])).unwrap_err();
    assert!(matches!(err, OcspCoreError::EmptyRequestList));
}

#[test]
fn test_unsupported_hash_rejected() {
    let md5 = ObjectIdentifier::new_unwrap("1.2.840.113549.2.5");
    let der = request_der(vec![Request {
        req_cert: cert_id_with(md5),
        single_request_extensions: None,
    }]);

    let err = DerCodec.decode_request(&der).unwrap_err();
    assert!(matches!(err, OcspCoreError::UnsupportedHashAlgorithm(_)));
}

#[test]
fn test_first_cert_id_wins() {
    let first = cert_id_with(HashAlgorithm::Sha256.oid());
    let mut second = cert_id_with(HashAlgorithm::Sha1.oid());
    second.serial_number = Serial::from(8).to_int().unwrap();

    let der = request_der(vec![
        Request {
            req_cert: first,
            single_request_extensions: None,
        },
        Request {
            req_cert: second,
            single_request_extensions: None,
        },
    ]);

    let request: OcspRequest = DerCodec.decode_request(&der).unwrap();
    assert_eq!(request.serial_number, Serial::from(7));
    assert_eq!(request.hash_algorithm, HashAlgorithm::Sha256);
}

#[test]
fn test_decode_serial_wider_than_twenty_octets() {
    let wide = Serial::from_unsigned_bytes(&[0x42; 30]).unwrap();
    let mut cert_id = cert_id_with(HashAlgorithm::Sha1.oid());
    cert_id.serial_number = wide.to_int().unwrap();

    let der = request_der(vec![Request {
        req_cert: cert_id,
        single_request_extensions: None,
    }]);

    let request = DerCodec.decode_request(&der).unwrap();
    assert_eq!(request.serial_number, wide);
    assert_eq!(request.serial_number.to_i64(), None);
}

// =============================================================================
// Issuer Digests
// =============================================================================

#[test]
fn test_issuer_digests_match_openssl() {
    let identity = identity();
    for raw in [REQ_SHA1, REQ_SHA256] {
        let request = DerCodec.decode_request(raw).unwrap();
        let algorithm = request.hash_algorithm;

        assert_eq!(
            issuer_name_hash(identity.ca_cert(), algorithm).unwrap(),
            request.issuer_name_hash,
            "name hash mismatch for {algorithm}"
        );
        assert_eq!(
            issuer_key_hash(identity.ca_cert(), algorithm),
            request.issuer_key_hash,
            "key hash mismatch for {algorithm}"
        );
    }
}

#[test]
fn test_other_ca_digests_differ() {
    let identity = identity();
    let request = DerCodec.decode_request(REQ_OTHER_CA).unwrap();

    assert_ne!(
        issuer_name_hash(identity.ca_cert(), request.hash_algorithm).unwrap(),
        request.issuer_name_hash
    );
    assert_ne!(
        issuer_key_hash(identity.ca_cert(), request.hash_algorithm),
        request.issuer_key_hash
    );

    let other = ResponderIdentity::from_pem(OTHER_CA_PEM, RESPONDER_PEM, RESPONDER_KEY).unwrap();
    assert_eq!(
        issuer_key_hash(other.ca_cert(), request.hash_algorithm),
        request.issuer_key_hash
    );
}

// =============================================================================
// Response Encoding
// =============================================================================

#[test]
fn test_good_response_structure() {
    let identity = identity();
    let template = template_for(CertificateStatus::Good);
    let bytes = DerCodec.encode_response(&template, identity.signer()).unwrap();

    let basic = decode_basic_response(&bytes).unwrap();
    let data = &basic.tbs_response_data;

    assert_eq!(
        data.responder_id,
        ResponderId::ByKey(OctetString::new(responder_key_hash(identity.responder_cert())).unwrap())
    );
    assert_eq!(data.produced_at, data.responses[0].this_update);
    assert_eq!(data.responses.len(), 1);

    let single = &data.responses[0];
    assert_eq!(single.cert_status, CertStatus::Good(der::asn1::Null));
    assert_eq!(single.cert_id.serial_number.as_bytes(), &[0x10, 0x01]);

    let this_update = from_generalized_time(single.this_update).unwrap();
    let next_update = from_generalized_time(single.next_update.unwrap()).unwrap();
    assert_eq!(this_update, template.this_update());
    assert_eq!(next_update - this_update, Duration::hours(24));

    let certs = basic.certs.as_ref().unwrap();
    assert_eq!(certs.len(), 1);
    assert_eq!(&certs[0], identity.responder_cert().as_ref());
}

#[test]
fn test_revoked_response_carries_reason() {
    let identity = identity();
    let revoked_at = Utc.with_ymd_and_hms(2030, 5, 17, 9, 12, 30).unwrap();
    let template = template_for(CertificateStatus::Revoked {
        reason: RevocationReason::KeyCompromise,
        revoked_at,
    });
    let bytes = DerCodec.encode_response(&template, identity.signer()).unwrap();

    let basic = decode_basic_response(&bytes).unwrap();
    match &basic.tbs_response_data.responses[0].cert_status {
        CertStatus::Revoked(info) => {
            assert_eq!(
                info.revocation_reason,
                Some(x509_cert::ext::pkix::CrlReason::KeyCompromise)
            );
            assert_eq!(from_generalized_time(info.revocation_time).unwrap(), revoked_at);
        }
        other => panic!("expected revoked status, got {other:?}"),
    }
}

#[test]
fn test_response_echoes_wide_serial() {
    let identity = identity();
    let mut request = DerCodec.decode_request(REQ_SHA1).unwrap();
    request.serial_number = Serial::from_unsigned_bytes(&[0xC3; 30]).unwrap();
    let this_update = Utc.with_ymd_and_hms(2030, 5, 17, 9, 0, 0).unwrap();
    let template = ResponseTemplate::new(
        &request,
        CertificateStatus::Good,
        this_update,
        this_update + Duration::days(1),
        identity.ca_cert().clone(),
        identity.responder_cert().clone(),
    )
    .unwrap();

    let bytes = DerCodec.encode_response(&template, identity.signer()).unwrap();
    let basic = decode_basic_response(&bytes).unwrap();
    let echoed = basic.tbs_response_data.responses[0].cert_id.serial_number.as_bytes();

    assert_eq!(echoed.len(), 31);
    assert_eq!(echoed, request.serial_number.as_bytes());
}

#[test]
fn test_unknown_response_status() {
    let identity = identity();
    let bytes = DerCodec
        .encode_response(&template_for(CertificateStatus::Unknown), identity.signer())
        .unwrap();

    let basic = decode_basic_response(&bytes).unwrap();
    assert_eq!(
        basic.tbs_response_data.responses[0].cert_status,
        CertStatus::Unknown(der::asn1::Null)
    );
}

#[test]
fn test_response_signature_verifies() {
    let identity = identity();
    let bytes = DerCodec
        .encode_response(&template_for(CertificateStatus::Good), identity.signer())
        .unwrap();
    let basic = decode_basic_response(&bytes).unwrap();

    let spki = identity
        .responder_cert()
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .unwrap();
    let public_key = RsaPublicKey::from_public_key_der(&spki).unwrap();
    let verifier = VerifyingKey::<Sha256>::new(public_key);

    let tbs = basic.tbs_response_data.to_der().unwrap();
    let signature = Signature::try_from(basic.signature.raw_bytes()).unwrap();
    verifier.verify(&tbs, &signature).expect("signature must verify");
}

#[test]
fn test_encoding_is_deterministic() {
    let identity = identity();
    let template = template_for(CertificateStatus::Good);

    let first = DerCodec.encode_response(&template, identity.signer()).unwrap();
    let second = DerCodec.encode_response(&template, identity.signer()).unwrap();
    assert_eq!(first, second);
}
