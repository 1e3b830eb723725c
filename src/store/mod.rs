//! # Storage Layer
//!
//! This module defines the durable-store abstraction for nook. The
//! [`StorageBackend`] trait handles the "how" of persistence (filesystem vs
//! memory), while the store handles the "what" (validation, tracking,
//! debouncing).
//!
//! ## Design Rationale
//!
//! Storage is abstracted behind a trait to:
//! - Enable **testing** with `MemBackend` (no filesystem needed)
//! - Allow **future backends** without changing core logic
//! - Keep mutation logic **decoupled** from persistence details
//!
//! ## Implementations
//!
//! - [`fs::FsBackend`]: Production file-based storage
//!   - One file per named store: `<sanitized-name>.json`
//!   - Content is the compact JSON serialization of the current value
//! - [`memory::MemBackend`]: In-memory storage for testing
//!   - No persistence, counts writes, can simulate write failures
//!
//! ## Storage Format
//!
//! For `FsBackend`:
//! ```text
//! .nook/
//! ├── users.json          # One named store
//! └── settings.json       # Another
//! ```
//!
//! There is no envelope, versioning, or checksum around the serialized
//! value, and no coordination between processes: the last writer wins.

use crate::error::Result;
use serde_json::Value;
use std::path::PathBuf;

pub mod fs;
pub mod memory;

/// Abstract interface for durable value storage.
///
/// `Send + Sync` because the debounced commit scheduler writes from a
/// worker thread.
pub trait StorageBackend: Send + Sync {
    /// Load the value stored under `name`.
    /// Returns `Ok(None)` if nothing is stored (useful for first-open
    /// seeding). Returns `Err` on I/O failure or unparseable content;
    /// store initialization treats the latter as absent.
    fn load(&self, name: &str) -> Result<Option<Value>>;

    /// Persist `value` under `name`.
    /// MUST be atomic (e.g. write to tmp then rename) so no reader ever
    /// observes a partially written value.
    fn save(&self, name: &str, value: &Value) -> Result<()>;

    /// The "file path" backing `name`.
    /// For `FsBackend` this is the real path; for `MemBackend`, a virtual one.
    fn file_path(&self, name: &str) -> PathBuf;
}
