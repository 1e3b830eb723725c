//! Debounced durable writes.
//!
//! [`CommitScheduler`] wraps a backend save with an optional quiet period.
//! With no window configured every commit writes inline before returning.
//! With a window, each commit replaces the single pending value and re-arms
//! the deadline; a worker thread writes the *latest* value once the burst
//! goes quiet. Intermediate states in a burst never reach disk, and there is
//! never more than one pending write per store.
//!
//! Durability caveat: a deferred write only survives while the scheduler
//! does. Dropping the scheduler flushes a pending write synchronously, but a
//! process that exits abnormally loses it. Deferred write failures have no
//! caller left to surface to and are dropped; no retry.

use crate::error::Result;
use crate::store::StorageBackend;
use serde_json::Value;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub struct CommitScheduler<S: StorageBackend + 'static> {
    backend: Arc<S>,
    name: String,
    delay: Duration,
    shared: Option<Arc<Shared>>,
    worker: Option<JoinHandle<()>>,
}

struct Shared {
    state: Mutex<State>,
    wakeup: Condvar,
}

struct State {
    pending: Option<(Instant, Value)>,
    shutdown: bool,
}

fn lock(mutex: &Mutex<State>) -> MutexGuard<'_, State> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl<S: StorageBackend + 'static> CommitScheduler<S> {
    pub fn new(backend: Arc<S>, name: String, delay_ms: u64) -> Self {
        let delay = Duration::from_millis(delay_ms);
        if delay.is_zero() {
            return Self {
                backend,
                name,
                delay,
                shared: None,
                worker: None,
            };
        }

        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                pending: None,
                shutdown: false,
            }),
            wakeup: Condvar::new(),
        });
        let worker = {
            let shared = Arc::clone(&shared);
            let backend = Arc::clone(&backend);
            let name = name.clone();
            thread::spawn(move || run_worker(shared, backend, name))
        };

        Self {
            backend,
            name,
            delay,
            shared: Some(shared),
            worker: Some(worker),
        }
    }

    /// Commit a new durable value.
    ///
    /// Inline mode writes before returning and surfaces the write error.
    /// Debounced mode replaces the pending value, re-arms the deadline, and
    /// always succeeds; the write happens later on the worker.
    pub fn commit(&self, value: &Value) -> Result<()> {
        match &self.shared {
            None => self.backend.save(&self.name, value),
            Some(shared) => {
                let mut state = lock(&shared.state);
                state.pending = Some((Instant::now() + self.delay, value.clone()));
                shared.wakeup.notify_one();
                Ok(())
            }
        }
    }
}

fn run_worker<S: StorageBackend>(shared: Arc<Shared>, backend: Arc<S>, name: String) {
    let mut state = lock(&shared.state);
    loop {
        let deadline = match &state.pending {
            Some((deadline, _)) => *deadline,
            None => {
                if state.shutdown {
                    return;
                }
                state = shared
                    .wakeup
                    .wait(state)
                    .unwrap_or_else(|e| e.into_inner());
                continue;
            }
        };

        let now = Instant::now();
        if state.shutdown || now >= deadline {
            if let Some((_, value)) = state.pending.take() {
                drop(state);
                // Nobody is left to report a deferred failure to.
                let _ = backend.save(&name, &value);
                state = lock(&shared.state);
            }
        } else {
            let (guard, _) = shared
                .wakeup
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            state = guard;
        }
    }
}

impl<S: StorageBackend + 'static> Drop for CommitScheduler<S> {
    fn drop(&mut self) {
        if let Some(shared) = &self.shared {
            let mut state = lock(&shared.state);
            state.shutdown = true;
            shared.wakeup.notify_one();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
