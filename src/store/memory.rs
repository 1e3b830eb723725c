use super::fs::sanitize_name;
use super::StorageBackend;
use crate::error::{NookError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory storage backend for testing.
///
/// Entries hold the *serialized* form so tests can assert on exact file
/// content, and so corrupt content can be seeded the same way a damaged
/// file would present. Uses `Mutex` rather than `RefCell` because the
/// debounce worker thread saves through the backend.
#[derive(Default)]
pub struct MemBackend {
    entries: Mutex<HashMap<String, String>>,
    saves: AtomicUsize,
    simulate_write_error: AtomicBool,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored content for `name`, exactly as a file would hold it.
    pub fn raw(&self, name: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// Number of successful saves across all names.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Seed raw content directly, bypassing serialization. Lets tests
    /// stage corrupt or schema-invalid stored state.
    pub fn seed_raw(&self, name: &str, raw: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), raw.to_string());
    }

    /// Make every subsequent save fail, for error-path testing.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }
}

impl StorageBackend for MemBackend {
    fn load(&self, name: &str) -> Result<Option<Value>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(name) {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => {
                let value: Value =
                    serde_json::from_str(raw).map_err(NookError::Serialization)?;
                Ok(Some(value))
            }
        }
    }

    fn save(&self, name: &str, value: &Value) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(NookError::Store("Simulated write error".to_string()));
        }
        let content = serde_json::to_string(value).map_err(NookError::Serialization)?;
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), content);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn file_path(&self, name: &str) -> PathBuf {
        PathBuf::from(format!("mem://{}.json", sanitize_name(name)))
    }
}
