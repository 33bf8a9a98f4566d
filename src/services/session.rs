//! Sticky credential cache shared by the operations of one process.

use crate::adapters::keystore::PrivateKeyEntry;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Holds the credential chosen with `sticky=true` so later operations can
/// reuse it without asking again. Last write wins.
#[derive(Debug, Default)]
pub struct SigningSession {
    sticky: Mutex<Option<PrivateKeyEntry>>,
}

impl SigningSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<PrivateKeyEntry>> {
        // The slot holds plain data, so a poisoned lock is still usable.
        self.sticky.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn sticky_credential(&self) -> Option<PrivateKeyEntry> {
        self.slot().clone()
    }

    pub fn set_sticky_credential(&self, entry: PrivateKeyEntry) {
        *self.slot() = Some(entry);
    }

    pub fn clear_sticky_credential(&self) {
        *self.slot() = None;
    }

    #[must_use]
    pub fn has_sticky_credential(&self) -> bool {
        self.slot().is_some()
    }
}
