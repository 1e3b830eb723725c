//! # Nook Architecture
//!
//! Nook is a **project-aware JSON persistence library**: one named store is
//! one JSON value mirrored to one file on disk. Every accepted in-memory
//! mutation is synchronized to storage, optionally validated first, and
//! optionally debounced.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Store handles (api.rs)                                     │
//! │  - Nook: get/set/update/subscribe whole-value facade        │
//! │  - Nook::tracked: per-property mutation views               │
//! │  - Shared open sequence (load → default → validate → heal)  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Mutation Tracker (tracker.rs, path.rs)                     │
//! │  - Simulates each write on a cloned root                    │
//! │  - Validates the candidate, commits only on acceptance      │
//! │  - Identity-stable nested views                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Commit Scheduler (debounce.rs)                             │
//! │  - Inline writes, or burst coalescing after a quiet period  │
//! │  - At most one pending write per store, last value wins     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - Abstract StorageBackend trait                            │
//! │  - FsBackend (production, atomic writes), MemBackend (test) │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Guarantees
//!
//! - The durable file, once a write completes, always holds some *validated*
//!   snapshot of the store's value, never a partial or rejected state.
//! - A rejected mutation is a synchronous error and changes nothing: not the
//!   in-memory value, not any view, not the file.
//! - A store whose file is missing, empty, corrupt, or schema-invalid opens
//!   with its default value and heals the file immediately.
//!
//! ## What Nook Does NOT Do
//!
//! - No coordination between processes: two instances on the same file are
//!   last-writer-wins.
//! - No multi-store transactions, no retries, no network.
//! - No schema language: validation is a pluggable [`Validator`].
//!
//! ## Module Overview
//!
//! - [`api`]: Store handles, open options, the shared open sequence
//! - [`tracker`]: The simulate-validate-commit mutation engine
//! - [`path`]: Segments and paths into nested values
//! - [`debounce`]: The debounced commit scheduler
//! - [`validator`]: The validation seam
//! - [`store`]: Storage abstraction and implementations
//! - [`project`]: Project-root discovery for the default store directory
//! - [`error`]: Error types

pub mod api;
pub mod debounce;
pub mod error;
pub mod path;
pub mod project;
pub mod store;
pub mod tracker;
pub mod validator;

pub use api::{Nook, NookOptions, SubscriptionId};
pub use error::{NookError, Result};
pub use path::{Path, Segment};
pub use tracker::Tracked;
pub use validator::{Validation, Validator};
