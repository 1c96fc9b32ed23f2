//! In-memory storage backend
//!
//! Suitable for development and tests. Data is lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ocsp_core::{RevocationReason, RevocationRecord, Serial};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::info;

use super::{RevocationStore, StorageError};

/// In-memory revocation store
#[derive(Debug, Default)]
pub struct MemoryStore {
    revocations: RwLock<HashMap<Serial, RevocationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a serial revoked, replacing any earlier record
    pub fn revoke(&self, serial: Serial, reason: RevocationReason, revoked_at: DateTime<Utc>) {
        info!(serial = %serial, reason = %reason, "Revoking serial");
        let record = RevocationRecord {
            serial: serial.clone(),
            reason,
            revoked_at,
        };
        self.write().insert(serial, record);
    }

    /// Remove a revocation. Returns whether one existed.
    pub fn unrevoke(&self, serial: &Serial) -> bool {
        let removed = self.write().remove(serial).is_some();
        if removed {
            info!(serial = %serial, "Removed revocation");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Serial, RevocationRecord>> {
        self.revocations
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Serial, RevocationRecord>> {
        self.revocations
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RevocationStore for MemoryStore {
    async fn lookup(&self, serial: &Serial) -> Result<Option<RevocationRecord>, StorageError> {
        Ok(self.read().get(serial).cloned())
    }

    async fn close(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
