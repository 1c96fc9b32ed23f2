//! Shared responder identity snapshot
//!
//! Request handlers read the identity through a single indirection. A
//! refresh replaces the whole `ResponderIdentity`, so a request always sees
//! a certificate together with its own key.

use ocsp_core::ResponderIdentity;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Default)]
pub struct IdentityHandle {
    current: Arc<RwLock<Option<Arc<ResponderIdentity>>>>,
}

impl IdentityHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle already holding `identity`
    pub fn with_identity(identity: ResponderIdentity) -> Self {
        let handle = Self::new();
        handle.replace(identity);
        handle
    }

    /// Snapshot of the identity in effect, if one has been loaded
    pub fn current(&self) -> Option<Arc<ResponderIdentity>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Swap in a new identity, returning the previous one
    pub fn replace(&self, identity: ResponderIdentity) -> Option<Arc<ResponderIdentity>> {
        let mut slot = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slot.replace(Arc::new(identity))
    }

    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }
}
