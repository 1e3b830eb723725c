//! Project-aware store directory resolution.
//!
//! With no explicit directory, store files live under `<project root>/.nook/`,
//! where the project root is found by walking upward from the starting
//! directory.

use directories::BaseDirs;
use std::path::{Path, PathBuf};

const STORE_DIR_NAME: &str = ".nook";

/// Markers that identify a directory as a project root.
const PROJECT_MARKERS: &[&str] = &[".git", "Cargo.toml", "package.json"];

/// Find the project root by walking up from `start` looking for a directory
/// that carries a project marker. Stops (without a match) once the home
/// directory has been checked, to avoid wandering into shared parents.
/// Returns None if no marker is found.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let home_dir = BaseDirs::new().map(|bd| bd.home_dir().to_path_buf());
    let mut current = start.to_path_buf();

    loop {
        if PROJECT_MARKERS.iter().any(|m| current.join(m).exists()) {
            return Some(current);
        }

        // Stop conditions: reached home dir or volume root
        if let Some(ref home) = home_dir {
            if &current == home {
                return None;
            }
        }

        match current.parent() {
            Some(parent) if parent != current => {
                current = parent.to_path_buf();
            }
            _ => {
                return None;
            }
        }
    }
}

/// Resolve the directory store files live in.
///
/// An explicit `dir` is used as-is. Otherwise the nearest project root gets a
/// `.nook/` subdirectory; when no project root is found, `start` itself does.
pub fn resolve_store_dir(start: &Path, dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = dir {
        return dir.to_path_buf();
    }
    let root = find_project_root(start).unwrap_or_else(|| start.to_path_buf());
    root.join(STORE_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_project_root_with_git() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir(root.join(".git")).unwrap();

        let result = find_project_root(root);
        assert_eq!(result, Some(root.to_path_buf()));
    }

    #[test]
    fn test_find_project_root_walks_up() {
        // Marker on the grandparent, nothing in between.
        let temp = TempDir::new().unwrap();
        let grandparent = temp.path();
        let child = grandparent.join("src").join("deep");

        fs::create_dir_all(&child).unwrap();
        fs::write(grandparent.join("Cargo.toml"), "[package]").unwrap();

        let result = find_project_root(&child);
        assert_eq!(result, Some(grandparent.to_path_buf()));
    }

    #[test]
    fn test_find_project_root_nearest_wins() {
        // Both parent and child are projects; child wins.
        let temp = TempDir::new().unwrap();
        let parent = temp.path();
        let child = parent.join("subproject");

        fs::create_dir(&child).unwrap();
        fs::create_dir(parent.join(".git")).unwrap();
        fs::write(child.join("package.json"), "{}").unwrap();

        let result = find_project_root(&child);
        assert_eq!(result, Some(child.clone()));
    }

    #[test]
    fn test_find_project_root_no_marker() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("some").join("deep").join("path");
        fs::create_dir_all(&dir).unwrap();

        let result = find_project_root(&dir);
        assert_eq!(result, None);
    }

    #[test]
    fn test_resolve_store_dir_explicit() {
        let temp = TempDir::new().unwrap();
        let explicit = temp.path().join("state");
        let resolved = resolve_store_dir(temp.path(), Some(&explicit));
        assert_eq!(resolved, explicit);
    }

    #[test]
    fn test_resolve_store_dir_project() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let child = root.join("nested");
        fs::create_dir(&child).unwrap();
        fs::create_dir(root.join(".git")).unwrap();

        let resolved = resolve_store_dir(&child, None);
        assert_eq!(resolved, root.join(".nook"));
    }

    #[test]
    fn test_resolve_store_dir_fallback() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("plain");
        fs::create_dir(&dir).unwrap();

        let resolved = resolve_store_dir(&dir, None);
        assert_eq!(resolved, dir.join(".nook"));
    }
}
