//! Search-path: resolves a filename suffix to its unique entry in an
//! installed package's manifest (spec §4.9).

use std::path::{Path, PathBuf};

use crate::error::CxxpmError;
use crate::install::manifest::parse_manifest;
use crate::util::pathconv::{convert, PathStyle};

/// Streams `manifest` line by line and returns the full path (prefix +
/// `install` + relative) of the unique entry whose relative path ends
/// with `suffix`. Zero matches or two-or-more matches are errors.
pub fn resolve(
    prefix: &Path,
    manifest: &str,
    suffix: &str,
    style: PathStyle,
) -> Result<String, CxxpmError> {
    let mut matches = Vec::new();
    for entry in parse_manifest(manifest) {
        let Ok(entry) = entry else { continue };
        if entry.relative_path.ends_with(suffix) {
            matches.push(entry.relative_path);
        }
    }

    match matches.len() {
        1 => {
            let full: PathBuf = prefix.join("install").join(&matches[0]);
            Ok(convert(&full, style))
        }
        _ => Err(CxxpmError::SearchPathAmbiguous(suffix.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_suffix_match_resolves() {
        let manifest = "bin/hw!".to_string() + &"a".repeat(64);
        let result = resolve(Path::new("/prefix"), &manifest, "hw", PathStyle::Native).unwrap();
        assert!(result.ends_with("install/bin/hw") || result.ends_with("install\\bin\\hw"));
    }

    #[test]
    fn zero_matches_is_an_error() {
        let manifest = "bin/hw!".to_string() + &"a".repeat(64);
        let result = resolve(Path::new("/prefix"), &manifest, "nope", PathStyle::Native);
        assert!(result.is_err());
    }

    #[test]
    fn multiple_matches_is_an_error() {
        let manifest = format!(
            "bin/hw!{}\nlib/hw!{}",
            "a".repeat(64),
            "b".repeat(64)
        );
        let result = resolve(Path::new("/prefix"), &manifest, "hw", PathStyle::Native);
        assert!(result.is_err());
    }
}
