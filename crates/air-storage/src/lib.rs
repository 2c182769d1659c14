//! Storage abstraction for Projeto Air.
//!
//! Registrations are kept in the browser, so persistence is a plain
//! string key-value store ([`KeyValueStore`]) holding one JSON array. The
//! array is append-only and shared with earlier versions of the site, so
//! its JSON field names are fixed.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`KeyValueStore`] trait with `get()` and `set()` methods
//! - [`SubmissionStore`], the read-modify-write submission list
//! - [`Registration`], [`Contribution`] and [`Submission`] records
//! - [`Clock`] with the [`SystemClock`] implementation
//! - [`MemoryStore`] and [`FixedClock`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use air_storage::{MemoryStore, SubmissionStore, SystemClock};
//!
//! let store = SubmissionStore::new(MemoryStore::new(), SystemClock, "projetoAir_submissions_v1");
//! let saved = store.save(registration)?;
//! assert_eq!(store.list(), vec![saved]);
//! ```

#[cfg(any(test, feature = "mock"))]
mod mock;
mod storage;
mod submission;

#[cfg(any(test, feature = "mock"))]
pub use mock::{FixedClock, MemoryStore};
pub use storage::{Clock, KeyValueStore, StorageError, StorageErrorKind, SystemClock};
pub use submission::{Contribution, Registration, Submission, SubmissionStore};
