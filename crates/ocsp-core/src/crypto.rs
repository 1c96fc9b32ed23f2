//! Digests and signing primitives used by OCSP
//!
//! - `HashAlgorithm`: CertID hash algorithms we can recompute
//! - issuer name / key digests for the issuer binding check
//! - `ResponseSigner`: signs `tbsResponseData`

use der::asn1::{BitString, ObjectIdentifier};
use der::{Any, Encode};
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use spki::AlgorithmIdentifierOwned;
use std::fmt;
use x509_cert::Certificate;

use crate::error::{OcspCoreError, Result};

pub const ID_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.14.3.2.26");
pub const ID_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");
pub const ID_SHA384: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.2");
pub const ID_SHA512: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.3");
pub const SHA256_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");

// =============================================================================
// Hash algorithms
// =============================================================================

/// Digest selected by a CertID `hashAlgorithm`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub fn from_oid(oid: &ObjectIdentifier) -> Result<Self> {
        match *oid {
            ID_SHA1 => Ok(Self::Sha1),
            ID_SHA256 => Ok(Self::Sha256),
            ID_SHA384 => Ok(Self::Sha384),
            ID_SHA512 => Ok(Self::Sha512),
            _ => Err(OcspCoreError::UnsupportedHashAlgorithm(oid.to_string())),
        }
    }

    pub fn oid(self) -> ObjectIdentifier {
        match self {
            Self::Sha1 => ID_SHA1,
            Self::Sha256 => ID_SHA256,
            Self::Sha384 => ID_SHA384,
            Self::Sha512 => ID_SHA512,
        }
    }

    /// AlgorithmIdentifier with explicit NULL parameters
    pub fn algorithm_identifier(self) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid: self.oid(),
            parameters: Some(Any::null()),
        }
    }

    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Issuer digests
// =============================================================================

/// Shift a BIT STRING so that unused bits are dropped from the front
/// instead of the back.
pub fn right_align(bits: &BitString) -> Vec<u8> {
    let raw = bits.raw_bytes();
    let shift = u32::from(bits.unused_bits());
    if shift == 0 || raw.is_empty() {
        return raw.to_vec();
    }

    let mut aligned = Vec::with_capacity(raw.len());
    aligned.push(raw[0] >> shift);
    for pair in raw.windows(2) {
        aligned.push((pair[0] << (8 - shift)) | (pair[1] >> shift));
    }
    aligned
}

/// Digest of the CA subject name, DER-encoded
pub fn issuer_name_hash(ca_cert: &Certificate, algorithm: HashAlgorithm) -> Result<Vec<u8>> {
    let subject = ca_cert
        .tbs_certificate
        .subject
        .to_der()
        .map_err(|e| OcspCoreError::Encode(format!("issuer name: {}", e)))?;
    Ok(algorithm.digest(&subject))
}

/// Digest of the CA public key bits (excluding tag, length and unused-bits octet)
pub fn issuer_key_hash(ca_cert: &Certificate, algorithm: HashAlgorithm) -> Vec<u8> {
    let key = &ca_cert.tbs_certificate.subject_public_key_info.subject_public_key;
    algorithm.digest(&right_align(key))
}

/// SHA-1 key hash used as the `byKey` ResponderID
pub fn responder_key_hash(responder_cert: &Certificate) -> Vec<u8> {
    issuer_key_hash(responder_cert, HashAlgorithm::Sha1)
}

// =============================================================================
// Signing
// =============================================================================

/// Signs the DER encoding of `tbsResponseData`
pub trait ResponseSigner: Send + Sync + fmt::Debug {
    /// Algorithm placed in `BasicOCSPResponse.signatureAlgorithm`
    fn signature_algorithm(&self) -> AlgorithmIdentifierOwned;

    fn sign(&self, tbs: &[u8]) -> Result<Vec<u8>>;
}

/// RSASSA-PKCS1-v1_5 with SHA-256. Deterministic: equal input gives equal
/// signatures.
#[derive(Clone)]
pub struct RsaResponseSigner {
    key: SigningKey<Sha256>,
}

impl RsaResponseSigner {
    pub fn new(private_key: RsaPrivateKey) -> Self {
        Self {
            key: SigningKey::<Sha256>::new(private_key),
        }
    }
}

impl fmt::Debug for RsaResponseSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaResponseSigner")
            .field("algorithm", &"sha256WithRSAEncryption")
            .finish_non_exhaustive()
    }
}

impl ResponseSigner for RsaResponseSigner {
    fn signature_algorithm(&self) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid: SHA256_WITH_RSA_ENCRYPTION,
            parameters: Some(Any::null()),
        }
    }

    fn sign(&self, tbs: &[u8]) -> Result<Vec<u8>> {
        let signature = self
            .key
            .try_sign(tbs)
            .map_err(|e| OcspCoreError::Signing(e.to_string()))?;
        Ok(signature.to_vec())
    }
}
