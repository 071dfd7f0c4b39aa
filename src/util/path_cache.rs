//! Process-wide executable-lookup cache over the `PATH` directories.
//!
//! Mirrors the reverse-scan tie-break of the original implementation:
//! later `PATH` entries shadow earlier ones, which matters for freshly
//! injected MSVC paths after a vcvarsall bootstrap.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Thread-safe executable name -> absolute path cache.
#[derive(Debug)]
pub struct PathCache {
    dirs: RwLock<Vec<PathBuf>>,
    found: RwLock<HashMap<String, PathBuf>>,
}

impl PathCache {
    pub fn new() -> Self {
        let cache = PathCache {
            dirs: RwLock::new(Vec::new()),
            found: RwLock::new(HashMap::new()),
        };
        cache.update();
        cache
    }

    /// Re-read `PATH` from the environment. Idempotent. Call this after any
    /// operation that mutates `PATH` in-process (e.g. the MSVC bootstrap).
    pub fn update(&self) {
        let raw = std::env::var("PATH").unwrap_or_default();
        let sep = if cfg!(windows) { ';' } else { ':' };
        let mut dirs = self.dirs.write().unwrap();
        dirs.clear();
        dirs.extend(raw.split(sep).filter(|s| !s.is_empty()).map(PathBuf::from));
        self.found.write().unwrap().clear();
    }

    /// Resolve a bare executable name to an absolute path, scanning `PATH`
    /// directories in reverse order. Returns `None` if not found.
    pub fn get(&self, name: &str) -> Option<PathBuf> {
        if let Some(hit) = self.found.read().unwrap().get(name) {
            return Some(hit.clone());
        }

        let candidate_name = if cfg!(windows) && !name.ends_with(".exe") {
            format!("{name}.exe")
        } else {
            name.to_string()
        };

        let dirs = self.dirs.read().unwrap();
        for dir in dirs.iter().rev() {
            let candidate = dir.join(&candidate_name);
            if candidate.is_file() {
                self.found
                    .write()
                    .unwrap()
                    .insert(name.to_string(), candidate.clone());
                return Some(candidate);
            }
        }

        None
    }

    /// Resolve `path`, returning it unchanged if already absolute.
    pub fn resolve(&self, path: &Path) -> Option<PathBuf> {
        if path.is_absolute() {
            return Some(path.to_path_buf());
        }
        self.get(&path.to_string_lossy())
    }
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_scan_prefers_later_path_entries() {
        let tmp = tempfile::TempDir::new().unwrap();
        let early = tmp.path().join("early");
        let late = tmp.path().join("late");
        std::fs::create_dir_all(&early).unwrap();
        std::fs::create_dir_all(&late).unwrap();
        std::fs::write(early.join("tool"), b"").unwrap();
        std::fs::write(late.join("tool"), b"").unwrap();

        let saved = std::env::var("PATH").unwrap_or_default();
        let joined = format!("{}:{}", early.display(), late.display());
        std::env::set_var("PATH", &joined);

        let cache = PathCache::new();
        let found = cache.get("tool").unwrap();
        assert_eq!(found, late.join("tool"));

        std::env::set_var("PATH", saved);
    }

    #[test]
    fn update_is_idempotent() {
        let cache = PathCache::new();
        cache.update();
        cache.update();
        assert!(cache.get("__definitely_not_on_path__").is_none());
    }
}
