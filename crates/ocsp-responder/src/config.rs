//! Responder configuration
//!
//! A `ConfigProvider` yields everything the responder needs to come up:
//! the identity material, the database URL and the listen port. Two
//! providers exist:
//! - `PemFileConfig`: PEM paths given on the command line or environment
//! - `SettingsFileConfig`: a TOML settings file, for service installs
//!
//! ```toml
//! [certificates]
//! ca_cert = "/etc/ocsp/ca.cer"
//! ocsp_cert = "/etc/ocsp/ocsp.cer"
//! ocsp_key = "/etc/ocsp/ocsp.key"
//!
//! [ocsp]
//! port = 8000
//! ```

use ocsp_core::{OcspCoreError, ResponderIdentity};
use serde::Deserialize;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;

/// Configuration loading failures. All are retried by the bootstrap.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(String),

    #[error("Invalid settings file {path}: {message}")]
    Invalid { path: String, message: String },

    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid responder identity: {0}")]
    Identity(#[from] OcspCoreError),

    #[error("Configuration load task failed: {0}")]
    Task(String),
}

/// Loaded configuration
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    pub identity: ResponderIdentity,
    pub database_url: String,
    pub port: u16,
}

/// Source of responder configuration
pub trait ConfigProvider: Send + Sync + Debug {
    fn load(&self) -> Result<ResponderConfig, ConfigError>;
}

/// Run `config.load()` on the blocking pool. Providers read files
/// synchronously and must stay off the async worker threads.
pub async fn load_config(
    config: Arc<dyn ConfigProvider>,
) -> Result<ResponderConfig, ConfigError> {
    tokio::task::spawn_blocking(move || config.load())
        .await
        .map_err(|e| ConfigError::Task(e.to_string()))?
}

// =============================================================================
// PEM files from flags
// =============================================================================

#[derive(Debug, Clone)]
pub struct PemFileConfig {
    pub ca_cert: PathBuf,
    pub responder_cert: PathBuf,
    pub responder_key: PathBuf,
    pub database_url: String,
    pub port: u16,
}

impl ConfigProvider for PemFileConfig {
    fn load(&self) -> Result<ResponderConfig, ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Missing("database URL".into()));
        }

        let identity =
            ResponderIdentity::from_files(&self.ca_cert, &self.responder_cert, &self.responder_key)?;

        Ok(ResponderConfig {
            identity,
            database_url: self.database_url.clone(),
            port: self.port,
        })
    }
}

// =============================================================================
// Settings file
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub certificates: CertificateSettings,
    #[serde(default)]
    pub ocsp: OcspSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CertificateSettings {
    pub ca_cert: PathBuf,
    pub ocsp_cert: PathBuf,
    pub ocsp_key: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcspSettings {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for OcspSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::Invalid {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Settings file provider. The file is re-read on every `load`, so a
/// retry picks up edits.
#[derive(Debug, Clone)]
pub struct SettingsFileConfig {
    path: PathBuf,
    database_url: Option<String>,
}

impl SettingsFileConfig {
    /// `database_url` falls back to `DATABASE_URL` at load time when `None`
    pub fn new(path: impl Into<PathBuf>, database_url: Option<String>) -> Self {
        Self {
            path: path.into(),
            database_url,
        }
    }
}

impl ConfigProvider for SettingsFileConfig {
    fn load(&self) -> Result<ResponderConfig, ConfigError> {
        let settings = Settings::from_file(&self.path)?;

        let database_url = self
            .database_url
            .clone()
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing("DATABASE_URL".into()))?;

        let certs = &settings.certificates;
        let identity = ResponderIdentity::from_files(&certs.ca_cert, &certs.ocsp_cert, &certs.ocsp_key)?;

        Ok(ResponderConfig {
            identity,
            database_url,
            port: settings.ocsp.port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn testdata(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../testdata")
            .join(name)
    }

    fn pem_config(database_url: &str) -> PemFileConfig {
        PemFileConfig {
            ca_cert: testdata("ca.pem"),
            responder_cert: testdata("responder.pem"),
            responder_key: testdata("responder.key"),
            database_url: database_url.into(),
            port: 9100,
        }
    }

    #[test]
    fn test_pem_config_loads() {
        let config = pem_config("postgres://localhost/pki").load().unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.database_url, "postgres://localhost/pki");
    }

    #[test]
    fn test_pem_config_requires_database_url() {
        let err = pem_config("  ").load().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_pem_config_missing_file() {
        let mut config = pem_config("postgres://localhost/pki");
        config.responder_key = PathBuf::from("/nonexistent/ocsp.key");
        let err = config.load().unwrap_err();
        assert!(matches!(err, ConfigError::Identity(OcspCoreError::Io { .. })));
    }

    #[test]
    fn test_settings_file_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ocsp.toml");
        std::fs::write(
            &path,
            format!(
                "[certificates]\nca_cert = {:?}\nocsp_cert = {:?}\nocsp_key = {:?}\n\n[ocsp]\nport = 8443\n",
                testdata("ca.pem"),
                testdata("responder.pem"),
                testdata("responder.key"),
            ),
        )
        .unwrap();

        let config = SettingsFileConfig::new(&path, Some("postgres://db/pki".into()))
            .load()
            .unwrap();
        assert_eq!(config.port, 8443);
        assert_eq!(config.database_url, "postgres://db/pki");
    }

    #[test]
    fn test_settings_port_defaults() {
        let settings: Settings = toml::from_str(
            "[certificates]\nca_cert = \"a\"\nocsp_cert = \"b\"\nocsp_key = \"c\"\n",
        )
        .unwrap();
        assert_eq!(settings.ocsp.port, DEFAULT_PORT);
    }

    #[test]
    fn test_settings_missing_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ocsp.toml");
        std::fs::write(&path, "[ocsp]\nport = 8000\n").unwrap();

        let err = SettingsFileConfig::new(&path, Some("postgres://db/pki".into()))
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_settings_file_absent() {
        let err = SettingsFileConfig::new("/nonexistent/ocsp.toml", None)
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
