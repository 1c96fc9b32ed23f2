//! Domain types shared by the codec, the verifier and the response builder

use chrono::{DateTime, Utc};
use der::asn1::Int;
use std::fmt;
use std::sync::Arc;
use x509_cert::ext::pkix::CrlReason;
use x509_cert::Certificate;

use crate::crypto::HashAlgorithm;
use crate::error::{OcspCoreError, Result};

// =============================================================================
// Serial numbers
// =============================================================================

/// Certificate serial number as carried in a CertID.
///
/// Serials are arbitrary-precision integers. The two's-complement content
/// octets are kept as decoded so the value is echoed back byte-for-byte,
/// whatever its width.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Serial(Vec<u8>);

impl Serial {
    /// Wrap a decoded INTEGER
    pub fn new(number: Int) -> Self {
        Self(number.as_bytes().to_vec())
    }

    /// Build a serial from big-endian unsigned bytes
    pub fn from_unsigned_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(OcspCoreError::Decode("serial number: empty".into()));
        }
        Ok(Self(minimal_unsigned(bytes)))
    }

    /// Two's-complement content octets of the INTEGER
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Re-wrap as a DER INTEGER for encoding
    pub fn to_int(&self) -> Result<Int> {
        Int::new(&self.0).map_err(|e| OcspCoreError::Encode(format!("serial number: {}", e)))
    }

    /// Convert to a signed 64-bit key, as used by integer-keyed stores.
    ///
    /// Returns `None` when the value does not fit in an `i64`.
    pub fn to_i64(&self) -> Option<i64> {
        let bytes = self.as_bytes();
        if bytes.is_empty() || bytes.len() > 8 {
            return None;
        }

        let fill = if bytes[0] & 0x80 != 0 { 0xFF } else { 0x00 };
        let mut buf = [fill; 8];
        buf[8 - bytes.len()..].copy_from_slice(bytes);
        Some(i64::from_be_bytes(buf))
    }
}

/// Strip redundant leading zeros, then keep the value positive
fn minimal_unsigned(bytes: &[u8]) -> Vec<u8> {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
    let mut content = Vec::with_capacity(bytes.len() - first + 1);
    if bytes[first] & 0x80 != 0 {
        content.push(0x00);
    }
    content.extend_from_slice(&bytes[first..]);
    content
}

impl From<u64> for Serial {
    fn from(value: u64) -> Self {
        Self(minimal_unsigned(&value.to_be_bytes()))
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

// =============================================================================
// Revocation data
// =============================================================================

/// RFC 5280 CRLReason codes. Code 7 is unassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevocationReason {
    Unspecified,
    KeyCompromise,
    CaCompromise,
    AffiliationChanged,
    Superseded,
    CessationOfOperation,
    CertificateHold,
    RemoveFromCrl,
    PrivilegeWithdrawn,
    AaCompromise,
}

impl RevocationReason {
    /// Map a stored integer code to a reason
    pub fn from_code(code: i32) -> Option<Self> {
        let reason = match code {
            0 => Self::Unspecified,
            1 => Self::KeyCompromise,
            2 => Self::CaCompromise,
            3 => Self::AffiliationChanged,
            4 => Self::Superseded,
            5 => Self::CessationOfOperation,
            6 => Self::CertificateHold,
            8 => Self::RemoveFromCrl,
            9 => Self::PrivilegeWithdrawn,
            10 => Self::AaCompromise,
            _ => return None,
        };
        Some(reason)
    }

    /// Integer code as stored and encoded on the wire
    pub fn code(self) -> i32 {
        match self {
            Self::Unspecified => 0,
            Self::KeyCompromise => 1,
            Self::CaCompromise => 2,
            Self::AffiliationChanged => 3,
            Self::Superseded => 4,
            Self::CessationOfOperation => 5,
            Self::CertificateHold => 6,
            Self::RemoveFromCrl => 8,
            Self::PrivilegeWithdrawn => 9,
            Self::AaCompromise => 10,
        }
    }
}

impl From<RevocationReason> for CrlReason {
    fn from(reason: RevocationReason) -> Self {
        match reason {
            RevocationReason::Unspecified => CrlReason::Unspecified,
            RevocationReason::KeyCompromise => CrlReason::KeyCompromise,
            RevocationReason::CaCompromise => CrlReason::CaCompromise,
            RevocationReason::AffiliationChanged => CrlReason::AffiliationChanged,
            RevocationReason::Superseded => CrlReason::Superseded,
            RevocationReason::CessationOfOperation => CrlReason::CessationOfOperation,
            RevocationReason::CertificateHold => CrlReason::CertificateHold,
            RevocationReason::RemoveFromCrl => CrlReason::RemoveFromCRL,
            RevocationReason::PrivilegeWithdrawn => CrlReason::PrivilegeWithdrawn,
            RevocationReason::AaCompromise => CrlReason::AaCompromise,
        }
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unspecified => "unspecified",
            Self::KeyCompromise => "keyCompromise",
            Self::CaCompromise => "cACompromise",
            Self::AffiliationChanged => "affiliationChanged",
            Self::Superseded => "superseded",
            Self::CessationOfOperation => "cessationOfOperation",
            Self::CertificateHold => "certificateHold",
            Self::RemoveFromCrl => "removeFromCRL",
            Self::PrivilegeWithdrawn => "privilegeWithdrawn",
            Self::AaCompromise => "aACompromise",
        };
        f.write_str(name)
    }
}

/// A serial the revocation store has marked revoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationRecord {
    pub serial: Serial,
    pub reason: RevocationReason,
    pub revoked_at: DateTime<Utc>,
}

// =============================================================================
// Requests and responses
// =============================================================================

/// Decoded single OCSP request (the first CertID of the request list)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcspRequest {
    pub serial_number: Serial,
    pub issuer_name_hash: Vec<u8>,
    pub issuer_key_hash: Vec<u8>,
    pub hash_algorithm: HashAlgorithm,
}

/// Status reported for a serial. Revocation details exist only for
/// `Revoked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateStatus {
    Good,
    Revoked {
        reason: RevocationReason,
        revoked_at: DateTime<Utc>,
    },
    Unknown,
}

impl CertificateStatus {
    pub fn is_revoked(&self) -> bool {
        matches!(self, Self::Revoked { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Revoked { .. } => "revoked",
            Self::Unknown => "unknown",
        }
    }
}

/// Everything needed to encode and sign one OCSP response
#[derive(Debug, Clone)]
pub struct ResponseTemplate {
    serial_number: Serial,
    hash_algorithm: HashAlgorithm,
    status: CertificateStatus,
    this_update: DateTime<Utc>,
    next_update: DateTime<Utc>,
    issuer_cert: Arc<Certificate>,
    responder_cert: Arc<Certificate>,
}

impl ResponseTemplate {
    /// Create a template, rejecting windows where `next_update` does not
    /// follow `this_update`.
    pub fn new(
        request: &OcspRequest,
        status: CertificateStatus,
        this_update: DateTime<Utc>,
        next_update: DateTime<Utc>,
        issuer_cert: Arc<Certificate>,
        responder_cert: Arc<Certificate>,
    ) -> Result<Self> {
        if next_update <= this_update {
            return Err(OcspCoreError::InvalidTemplate(format!(
                "nextUpdate {} is not after thisUpdate {}",
                next_update, this_update
            )));
        }

        Ok(Self {
            serial_number: request.serial_number.clone(),
            hash_algorithm: request.hash_algorithm,
            status,
            this_update,
            next_update,
            issuer_cert,
            responder_cert,
        })
    }

    pub fn serial_number(&self) -> &Serial {
        &self.serial_number
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    pub fn status(&self) -> CertificateStatus {
        self.status
    }

    /// Present iff the status is `Revoked`
    pub fn revocation_reason(&self) -> Option<RevocationReason> {
        match self.status {
            CertificateStatus::Revoked { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn this_update(&self) -> DateTime<Utc> {
        self.this_update
    }

    pub fn next_update(&self) -> DateTime<Utc> {
        self.next_update
    }

    pub fn issuer_cert(&self) -> &Certificate {
        &self.issuer_cert
    }

    pub fn responder_cert(&self) -> &Certificate {
        &self.responder_cert
    }
}
