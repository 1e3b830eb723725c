//! # Store handle and initialization
//!
//! [`Nook`] is the simple, whole-value store facade: `get`, `set`, `update`,
//! `subscribe`. [`Nook::tracked`] opens the same named store as a mutation
//! [`Tracked`] view instead, for callers that want per-property writes.
//!
//! ## Opening a store
//!
//! Both entry points share one initialization sequence:
//!
//! 1. Resolve the store directory (explicit `dir`, else the nearest project
//!    root's `.nook/`).
//! 2. Load the stored value. A missing file, an empty file, and unparseable
//!    content all count as absent: the default value is used and persisted
//!    immediately.
//! 3. With a validator configured, validate the working value. Acceptance
//!    keeps the (possibly normalized) accepted value; rejection falls back
//!    to the default, persisted immediately.
//!
//! A corrupted or schema-incompatible stored value is therefore silently
//! replaced by the default at open: self-healing, never a startup error.
//!
//! ## Replacement semantics
//!
//! `set` validates the *entire* replacement value, stores the validator's
//! accepted value, persists through the commit scheduler, and then notifies
//! subscribers synchronously in registration order. `update` is
//! clone-mutate-set. Listeners run after the value is committed; a panicking
//! listener does not roll anything back.

use crate::debounce::CommitScheduler;
use crate::error::{NookError, Result};
use crate::project::resolve_store_dir;
use crate::store::fs::FsBackend;
use crate::store::StorageBackend;
use crate::tracker::Tracked;
use crate::validator::{Validation, Validator};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How to open a named store.
pub struct NookOptions {
    name: String,
    default_value: Value,
    validator: Option<Box<dyn Validator>>,
    dir: Option<PathBuf>,
    write_debounce_ms: u64,
}

impl NookOptions {
    pub fn new(name: impl Into<String>, default_value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default_value: default_value.into(),
            validator: None,
            dir: None,
            write_debounce_ms: 0,
        }
    }

    /// Validate every candidate value (loaded, set, or mutated) before it
    /// is accepted.
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Store files directly under `dir` instead of the project's `.nook/`.
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Coalesce bursts of writes into one durable write after `ms` of quiet.
    /// `0` (the default) writes synchronously on every accepted mutation.
    pub fn write_debounce_ms(mut self, ms: u64) -> Self {
        self.write_debounce_ms = ms;
        self
    }
}

/// Identifies one registered listener; see [`Nook::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// A named store handle with whole-value replacement semantics.
///
/// Generic over [`StorageBackend`]: production uses [`FsBackend`], tests
/// inject [`MemBackend`](crate::store::memory::MemBackend).
pub struct Nook<S: StorageBackend + 'static = FsBackend> {
    name: String,
    file_path: PathBuf,
    value: Value,
    validator: Option<Box<dyn Validator>>,
    listeners: Vec<(SubscriptionId, Box<dyn FnMut(&Value)>)>,
    next_subscription: u64,
    scheduler: CommitScheduler<S>,
}

impl Nook<FsBackend> {
    /// Open a file-backed store in the resolved project directory.
    pub fn create(options: NookOptions) -> Result<Self> {
        let backend = Arc::new(file_backend(&options)?);
        Self::with_backend(backend, options)
    }

    /// Open the named store as a tracked root view instead of a facade.
    /// Every accepted write on the view (or its children) is persisted
    /// through the same scheduler.
    pub fn tracked(options: NookOptions) -> Result<Tracked> {
        let backend = Arc::new(file_backend(&options)?);
        Self::tracked_with_backend(backend, options)
    }
}

fn file_backend(options: &NookOptions) -> Result<FsBackend> {
    let cwd = std::env::current_dir().map_err(NookError::Io)?;
    Ok(FsBackend::new(resolve_store_dir(&cwd, options.dir.as_deref())))
}

impl<S: StorageBackend + 'static> Nook<S> {
    /// Open against an injected backend. `options.dir` is ignored here; the
    /// backend already knows where it stores things.
    pub fn with_backend(backend: Arc<S>, options: NookOptions) -> Result<Self> {
        let NookOptions {
            name,
            default_value,
            validator,
            dir: _,
            write_debounce_ms,
        } = options;

        let value = load_or_default(backend.as_ref(), &name, &default_value, validator.as_deref())?;
        let file_path = backend.file_path(&name);
        let scheduler = CommitScheduler::new(backend, name.clone(), write_debounce_ms);

        Ok(Self {
            name,
            file_path,
            value,
            validator,
            listeners: Vec::new(),
            next_subscription: 0,
            scheduler,
        })
    }

    /// Tracked-view variant of [`Nook::with_backend`].
    pub fn tracked_with_backend(backend: Arc<S>, options: NookOptions) -> Result<Tracked> {
        let NookOptions {
            name,
            default_value,
            validator,
            dir: _,
            write_debounce_ms,
        } = options;

        let value = load_or_default(backend.as_ref(), &name, &default_value, validator.as_deref())?;
        let scheduler = CommitScheduler::new(backend, name, write_debounce_ms);

        Ok(Tracked::new_root(
            value,
            validator,
            Box::new(move |root| scheduler.commit(root)),
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// The current value.
    pub fn get(&self) -> &Value {
        &self.value
    }

    /// The current value, deserialized.
    pub fn get_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.value.clone()).map_err(NookError::Serialization)
    }

    /// Replace the whole value: validate, store the accepted value, persist,
    /// then notify subscribers in registration order.
    pub fn set(&mut self, next: impl Into<Value>) -> Result<()> {
        let next = next.into();
        let accepted = match &self.validator {
            None => next,
            Some(validator) => match validator.validate(&next) {
                Validation::Accepted(accepted) => accepted,
                Validation::Rejected(reason) => {
                    return Err(NookError::ValidationRejected(reason));
                }
            },
        };

        self.value = accepted;
        self.scheduler.commit(&self.value)?;
        self.notify();
        Ok(())
    }

    /// Serialize-and-set convenience.
    pub fn set_from<T: Serialize>(&mut self, next: &T) -> Result<()> {
        let value = serde_json::to_value(next).map_err(NookError::Serialization)?;
        self.set(value)
    }

    /// Clone the current value, let `mutator` rework the clone, then behave
    /// as [`Nook::set`] with the result. Returns the new current value.
    pub fn update<F: FnOnce(&mut Value)>(&mut self, mutator: F) -> Result<&Value> {
        let mut draft = self.value.clone();
        mutator(&mut draft);
        self.set(draft)?;
        Ok(&self.value)
    }

    /// Register a listener invoked synchronously on every successful `set`.
    pub fn subscribe<F: FnMut(&Value) + 'static>(&mut self, listener: F) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove exactly the listener registered under `id`. Safe to call for
    /// an already-removed id.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
    }

    fn notify(&mut self) {
        let Nook {
            ref value,
            ref mut listeners,
            ..
        } = *self;
        for (_, listener) in listeners.iter_mut() {
            listener(value);
        }
    }
}

/// Shared open sequence for both entry points.
fn load_or_default<S: StorageBackend>(
    backend: &S,
    name: &str,
    default: &Value,
    validator: Option<&dyn Validator>,
) -> Result<Value> {
    let loaded = match backend.load(name) {
        Ok(v) => v,
        // Unparseable stored content self-heals to the default.
        Err(NookError::Serialization(_)) => None,
        Err(e) => return Err(e),
    };

    let mut value = match loaded {
        Some(v) => v,
        None => {
            let v = default.clone();
            backend.save(name, &v)?;
            v
        }
    };

    if let Some(validator) = validator {
        value = match validator.validate(&value) {
            Validation::Accepted(accepted) => accepted,
            Validation::Rejected(_) => {
                let fallback = default.clone();
                backend.save(name, &fallback)?;
                fallback
            }
        };
    }

    Ok(value)
}
