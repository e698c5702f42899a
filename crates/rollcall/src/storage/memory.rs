//! In-process record store.
//!
//! Holds the sequence in memory behind a mutex. Used for embedding and for
//! exercising the submission path without touching the filesystem.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::error::{Error, Result};
use crate::record::AttendanceRecord;

use super::RecordStore;

/// Record store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<AttendanceRecord>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with records.
    #[must_use]
    pub fn with_records(records: Vec<AttendanceRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Make every following save fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl RecordStore for MemoryStore {
    fn load(&self) -> Vec<AttendanceRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, records: &[AttendanceRecord]) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::StoreWrite {
                path: "<memory>".into(),
                source: std::io::Error::other("saves are disabled"),
            });
        }

        *self.records.lock().unwrap_or_else(PoisonError::into_inner) = records.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
