use super::StorageBackend;
use crate::error::{NookError, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File-based storage: one `<sanitized-name>.json` per store under `dir`.
pub struct FsBackend {
    dir: PathBuf,
}

impl FsBackend {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(NookError::Io)?;
        }
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn load(&self, name: &str) -> Result<Option<Value>> {
        let path = self.file_path(name);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(NookError::Io)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let value: Value = serde_json::from_str(&content).map_err(NookError::Serialization)?;
        Ok(Some(value))
    }

    fn save(&self, name: &str, value: &Value) -> Result<()> {
        self.ensure_dir()?;

        let target = self.file_path(name);
        // Compact serialization, no trailing newline. The file content is
        // exactly the serialized value, nothing else.
        let content = serde_json::to_string(value).map_err(NookError::Serialization)?;

        // Atomic write: tmp in the same directory, then rename over.
        let tmp = self
            .dir
            .join(format!(".{}-{}.tmp", sanitize_name(name), Uuid::new_v4()));
        fs::write(&tmp, content).map_err(NookError::Io)?;
        fs::rename(&tmp, &target).map_err(NookError::Io)?;

        Ok(())
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_name(name)))
    }
}

/// Turn a store name into a safe filename stem: runs of non-letters collapse
/// to a single `-`, leading/trailing dashes are trimmed, and the result is
/// lowercased. Names that sanitize to nothing become `"unnamed"`.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphabetic() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        "unnamed".to_string()
    } else {
        out
    }
}
