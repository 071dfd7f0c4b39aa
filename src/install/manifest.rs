//! Manifest-based idempotent-install verification (spec §4.7 step 1, §8).

use std::path::Path;
use std::time::{Duration, Instant};

use walkdir::WalkDir;

use crate::util::hash::{hex_full, sha3_file};

/// Progressive-verification time budget: a contract, not a tuning knob —
/// kept as a named constant so tests can override it.
pub const VERIFY_BUDGET: Duration = Duration::from_millis(125);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub relative_path: String,
    pub hex_hash: String,
}

pub fn parse_manifest(contents: &str) -> Vec<Result<ManifestEntry, String>> {
    contents
        .lines()
        .filter(|l| !l.is_empty())
        .map(|line| match line.rsplit_once('!') {
            Some((path, hash)) if hash.len() == 64 && hash.chars().all(|c| c.is_ascii_hexdigit()) => {
                Ok(ManifestEntry {
                    relative_path: path.to_string(),
                    hex_hash: hash.to_string(),
                })
            }
            _ => Err(format!("broken manifest line: `{line}`")),
        })
        .collect()
}

/// Returns `true` iff the install under `install_dir` matches `manifest`,
/// spending at most [`VERIFY_BUDGET`] re-hashing files before giving up
/// and declaring the package installed (a cold install is verified in
/// full; a warm re-invocation pays a bounded cost). Any mismatch or
/// unreadable file is an immediate `false` — the package is then treated
/// as not installed and reinstalled destructively (spec's
/// `ManifestWarning` policy).
pub fn verify(install_dir: &Path, manifest: &str) -> bool {
    let entries = parse_manifest(manifest);
    let start = Instant::now();

    for entry in entries {
        let Ok(entry) = entry else {
            return false;
        };
        if start.elapsed() > VERIFY_BUDGET {
            return true;
        }
        let path = install_dir.join(&entry.relative_path);
        let Ok(digest) = sha3_file(&path) else {
            return false;
        };
        if hex_full(&digest) != entry.hex_hash {
            return false;
        }
    }

    true
}

/// Walks `install_dir` depth-first and renders `<relpath>!<hex-hash>`
/// lines for every regular file.
pub fn build_manifest(install_dir: &Path) -> std::io::Result<String> {
    let mut lines = Vec::new();
    for entry in WalkDir::new(install_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(install_dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        let digest = sha3_file(entry.path())?;
        lines.push(format!("{relative}!{}", hex_full(&digest)));
    }
    Ok(lines.join("\n") + if lines.is_empty() { "" } else { "\n" })
}
