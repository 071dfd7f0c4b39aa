//! Host name/processor detection and the closed normalization tables.

use std::process::Command;

/// Returns `"Windows"` on Windows, otherwise the first line of `uname -s`.
pub fn system_name() -> String {
    if cfg!(windows) {
        return "Windows".to_string();
    }
    uname_field("-s").unwrap_or_else(|| "Unknown".to_string())
}

/// Returns the normalized host processor.
pub fn system_processor() -> String {
    if cfg!(windows) {
        return windows_processor();
    }
    let raw = uname_field("-m").unwrap_or_else(|| "unknown".to_string());
    normalize_processor(&raw)
}

fn uname_field(flag: &str) -> Option<String> {
    let output = Command::new("uname").arg(flag).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .and_then(|s| s.lines().next().map(str::to_string))
}

#[cfg(windows)]
fn windows_processor() -> String {
    // IsWow64Process2 is the accurate source of truth on Windows 10 1709+;
    // std::env::consts::ARCH is a reasonable fallback when that API (or the
    // raw syscall plumbing) isn't wired up in a given build.
    normalize_processor(std::env::consts::ARCH)
}

#[cfg(not(windows))]
#[allow(dead_code)]
fn windows_processor() -> String {
    unreachable!("windows_processor is only called on cfg(windows)")
}

/// Closed normalization table (spec §4.3). Case-insensitive on the known
/// aliases; unrecognized input passes through unchanged.
pub fn normalize_processor(input: &str) -> String {
    match input {
        "arm64" | "ARM64" => "aarch64".to_string(),
        "AMD64" | "x64" => "x86_64".to_string(),
        "i386" | "i686" => "x86".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_table_matches_spec() {
        assert_eq!(normalize_processor("arm64"), "aarch64");
        assert_eq!(normalize_processor("ARM64"), "aarch64");
        assert_eq!(normalize_processor("AMD64"), "x86_64");
        assert_eq!(normalize_processor("x64"), "x86_64");
        assert_eq!(normalize_processor("i386"), "x86");
        assert_eq!(normalize_processor("i686"), "x86");
    }

    #[test]
    fn normalize_passthrough_for_unknown() {
        assert_eq!(normalize_processor("riscv64"), "riscv64");
    }

    #[test]
    fn system_name_is_non_empty() {
        assert!(!system_name().is_empty());
    }
}
