//! Responder identity: CA certificate, responder certificate and signing key

use der::DecodePem;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use x509_cert::Certificate;

use crate::crypto::{ResponseSigner, RsaResponseSigner};
use crate::error::{OcspCoreError, Result};

/// Material a responder signs with. Loaded as a unit and never mutated;
/// refreshing credentials means building a new identity.
#[derive(Debug, Clone)]
pub struct ResponderIdentity {
    ca_cert: Arc<Certificate>,
    responder_cert: Arc<Certificate>,
    signer: Arc<dyn ResponseSigner>,
}

impl ResponderIdentity {
    pub fn new(
        ca_cert: Certificate,
        responder_cert: Certificate,
        signer: Arc<dyn ResponseSigner>,
    ) -> Self {
        Self {
            ca_cert: Arc::new(ca_cert),
            responder_cert: Arc::new(responder_cert),
            signer,
        }
    }

    /// Build from PEM text. The key may be PKCS#8 (`PRIVATE KEY`) or
    /// PKCS#1 (`RSA PRIVATE KEY`).
    pub fn from_pem(ca_pem: &str, responder_pem: &str, key_pem: &str) -> Result<Self> {
        let ca_cert = parse_certificate(ca_pem, "CA")?;
        let responder_cert = parse_certificate(responder_pem, "responder")?;
        let key = parse_private_key(key_pem)?;

        Ok(Self::new(
            ca_cert,
            responder_cert,
            Arc::new(RsaResponseSigner::new(key)),
        ))
    }

    /// Read and parse the three PEM files
    pub fn from_files(ca_path: &Path, responder_path: &Path, key_path: &Path) -> Result<Self> {
        let ca_pem = read_pem(ca_path)?;
        let responder_pem = read_pem(responder_path)?;
        let key_pem = read_pem(key_path)?;

        let identity = Self::from_pem(&ca_pem, &responder_pem, &key_pem)?;
        debug!(
            ca = %ca_path.display(),
            cert = %responder_path.display(),
            "Loaded responder identity"
        );
        Ok(identity)
    }

    pub fn ca_cert(&self) -> &Arc<Certificate> {
        &self.ca_cert
    }

    pub fn responder_cert(&self) -> &Arc<Certificate> {
        &self.responder_cert
    }

    pub fn signer(&self) -> &dyn ResponseSigner {
        self.signer.as_ref()
    }
}

fn read_pem(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| OcspCoreError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn parse_certificate(pem: &str, which: &str) -> Result<Certificate> {
    Certificate::from_pem(pem)
        .map_err(|e| OcspCoreError::Certificate(format!("{} certificate: {}", which, e)))
}

fn parse_private_key(pem: &str) -> Result<RsaPrivateKey> {
    match RsaPrivateKey::from_pkcs8_pem(pem) {
        Ok(key) => Ok(key),
        Err(pkcs8_err) => RsaPrivateKey::from_pkcs1_pem(pem).map_err(|pkcs1_err| {
            OcspCoreError::PrivateKey(format!(
                "not PKCS#8 ({}) nor PKCS#1 ({})",
                pkcs8_err, pkcs1_err
            ))
        }),
    }
}
