//! Path-style conversion for shell fragments and CMake glue: native,
//! POSIX (drive letters rewritten for a Windows shell like Git Bash), and
//! CMake-flavor (forward slashes, drive letter kept).

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStyle {
    Native,
    Posix,
    Cmake,
}

impl PathStyle {
    pub fn from_str_opt(s: &str) -> Option<PathStyle> {
        match s {
            "native" => Some(PathStyle::Native),
            "posix" => Some(PathStyle::Posix),
            "cmake" => Some(PathStyle::Cmake),
            _ => None,
        }
    }
}

/// Rewrites a Windows drive-letter prefix (`C:\x\y` or `C:/x/y`) into the
/// POSIX shell spelling `/c/x/y`. Paths with no drive letter are only
/// slash-normalized.
pub fn posix_path(path: &str) -> String {
    let bytes = path.as_bytes();
    let rest = if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        let drive = (bytes[0] as char).to_ascii_lowercase();
        format!("/{drive}{}", &path[2..])
    } else {
        path.to_string()
    };
    rest.replace('\\', "/")
}

/// Forward-slash-only spelling that keeps the drive letter as-is
/// (`C:\x\y` -> `C:/x/y`), the format CMake itself expects.
pub fn cmake_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Converts `path` to the requested style. `Native` returns the path
/// unchanged (platform-native separators are assumed already correct).
pub fn convert(path: &Path, style: PathStyle) -> String {
    let s = path.to_string_lossy();
    match style {
        PathStyle::Native => s.into_owned(),
        PathStyle::Posix => posix_path(&s),
        PathStyle::Cmake => cmake_path(&s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posix_path_rewrites_drive_letter() {
        assert_eq!(posix_path(r"C:\x\y"), "/c/x/y");
        assert_eq!(posix_path("C:/x/y"), "/c/x/y");
    }

    #[test]
    fn posix_path_leaves_unix_paths_alone() {
        assert_eq!(posix_path("/usr/local/lib"), "/usr/local/lib");
    }

    #[test]
    fn cmake_path_keeps_drive_letter() {
        assert_eq!(cmake_path(r"C:\x\y"), "C:/x/y");
    }

    #[test]
    fn from_str_opt_rejects_unknown() {
        assert_eq!(PathStyle::from_str_opt("bogus"), None);
        assert_eq!(PathStyle::from_str_opt("posix"), Some(PathStyle::Posix));
    }
}
