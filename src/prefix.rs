//! Deterministic install-prefix derivation (spec §4.5).

use crate::util::hash::{hex_truncated_128, sha3_str};

/// `toolchain_id` = hex(SHA3-256("<target_sys>-<target_proc>[-<compiler_id>]*")[..16]),
/// deduping consecutive-duplicate compiler ids (C and C++ sharing one `cl`).
pub fn toolchain_id(target_system: &str, target_processor: &str, compiler_ids: &[String]) -> String {
    let mut parts = vec![target_system.to_string(), target_processor.to_string()];
    let mut last: Option<&str> = None;
    for id in compiler_ids {
        if last != Some(id.as_str()) {
            parts.push(id.clone());
            last = Some(id.as_str());
        }
    }
    hex_truncated_128(&sha3_str(&parts.join("-")))
}

/// `package_id` = hex(SHA3-256("<version>-<build_type>")[..16]).
pub fn package_id(version: &str, build_type: &str) -> String {
    hex_truncated_128(&sha3_str(&format!("{version}-{build_type}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toolchain_id_is_32_hex_chars() {
        let id = toolchain_id("Linux", "x86_64", &["gcc-13.2.0-x86_64-linux-gnu".to_string()]);
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn toolchain_id_dedupes_consecutive_duplicate_compilers() {
        let shared = "cl-x64-19.38".to_string();
        let deduped = toolchain_id("Windows", "x86_64", &[shared.clone(), shared.clone()]);
        let single = toolchain_id("Windows", "x86_64", &[shared]);
        assert_eq!(deduped, single);
    }

    #[test]
    fn toolchain_id_is_sensitive_to_target() {
        let a = toolchain_id("Linux", "x86_64", &[]);
        let b = toolchain_id("Linux", "aarch64", &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn package_id_independent_of_toolchain_id() {
        let p1 = package_id("1.0", "Release");
        let p2 = package_id("1.0", "Release");
        assert_eq!(p1, p2);
        assert_eq!(p1.len(), 32);
    }
}
