//! In-memory store and fixed clock for testing.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::storage::{Clock, KeyValueStore, StorageError, StorageErrorKind};

/// In-memory [`KeyValueStore`].
///
/// Use the builder methods to seed data or make the store fail.
///
/// ```ignore
/// let store = MemoryStore::new().with_entry("projetoAir_submissions_v1", "[]");
/// assert_eq!(store.get("projetoAir_submissions_v1")?, Some("[]".to_owned()));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value.
    #[must_use]
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.borrow_mut().insert(key.into(), value.into());
        self
    }

    /// Make every `set` fail with a quota error.
    #[must_use]
    pub fn with_failing_writes(self) -> Self {
        self.fail_writes.set(true);
        self
    }

    /// Make every `get` fail as if storage were disabled.
    #[must_use]
    pub fn with_failing_reads(self) -> Self {
        self.fail_reads.set(true);
        self
    }

    /// Raw value under `key`, bypassing failure injection.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    /// Number of successful writes.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.get() {
            return Err(StorageError::new(StorageErrorKind::Unavailable)
                .with_backend("Memory")
                .with_key(key));
        }
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.get() {
            return Err(StorageError::new(StorageErrorKind::QuotaExceeded)
                .with_backend("Memory")
                .with_key(key));
        }
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

/// Clock frozen at a given instant, movable by hand.
#[derive(Debug)]
pub struct FixedClock {
    now: Cell<DateTime<Utc>>,
}

impl FixedClock {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}
