//! Cursor store with injectable failures.

use async_trait::async_trait;
use ember_core::cursor::{CursorStore, CursorStoreError};
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// A [`CursorStore`] whose loads and saves can be made to fail.
///
/// Successful saves still land in memory, so tests can verify what would
/// have been persisted once the store heals.
#[derive(Default)]
pub struct FlakyCursorStore {
    block: Mutex<Option<u64>>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
}

impl FlakyCursorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_block(block: u64) -> Self {
        let store = Self::default();
        *store.block.lock() = Some(block);
        store
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Last successfully saved block.
    #[must_use]
    pub fn saved_block(&self) -> Option<u64> {
        *self.block.lock()
    }
}

#[async_trait]
impl CursorStore for FlakyCursorStore {
    async fn load(&self) -> Result<Option<u64>, CursorStoreError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(CursorStoreError::Io(io::Error::new(
                io::ErrorKind::Other,
                "scripted load failure",
            )));
        }
        Ok(*self.block.lock())
    }

    async fn save(&self, block: u64) -> Result<(), CursorStoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(CursorStoreError::Io(io::Error::new(
                io::ErrorKind::Other,
                "scripted save failure",
            )));
        }
        *self.block.lock() = Some(block);
        Ok(())
    }
}
