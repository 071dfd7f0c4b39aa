//! CompilerProbe + ToolchainCoordinator: detect GNU/Clang/MSVC compilers,
//! reconcile them against a requested target, and select auxiliary tools.

pub mod gcc;
pub mod msvc;

use std::path::{Path, PathBuf};

use crate::error::CxxpmError;
use crate::model::{CompilerInfo, CompilerType, Language, SystemInfo, ToolType};
use crate::util::process::ProcessRunner;

/// GNU target-triple system suffix -> (normalized system, sub-type).
const GNU_SYSTEM_TABLE: &[(&str, &str, &str)] = &[
    ("apple-darwin", "Darwin", ""),
    ("linux-gnu", "Linux", ""),
    ("pc-cygwin", "Windows", "cygwin"),
    ("w64-mingw32", "Windows", "mingw-w64"),
];

pub fn normalize_gnu_system(suffix: &str) -> Option<(&'static str, &'static str)> {
    GNU_SYSTEM_TABLE
        .iter()
        .find(|(prefix, _, _)| suffix.ends_with(prefix) || suffix == *prefix)
        .map(|(_, sys, sub)| (*sys, *sub))
}

/// Bidirectional-only rows are invertible; the others are GNU->normalized
/// only (spec §4.4).
pub fn normalize_gnu_processor(input: &str) -> String {
    match input {
        "arm64" => "aarch64".to_string(),
        "i386" | "i486" | "i586" | "i686" => "x86".to_string(),
        other => other.to_string(),
    }
}

pub fn denormalize_to_gnu_processor(normalized: &str) -> Option<&'static str> {
    match normalized {
        "aarch64" => Some("arm64"),
        "x86" => Some("i686"),
        _ => None,
    }
}

/// Finds a usable compiler for `language`. If `requested_command` is set,
/// only that path is tried. Otherwise platform defaults are tried in
/// order: on Windows, MSVC first, then gcc/g++, then clang/clang++; on
/// POSIX, `cc`/`c++` only.
pub fn find_compiler(
    language: Language,
    requested_command: Option<&Path>,
    target: &SystemInfo,
    runner: &ProcessRunner,
) -> Result<CompilerInfo, CxxpmError> {
    if let Some(cmd) = requested_command {
        return gcc::probe(cmd, runner).or_else(|_| msvc::probe(cmd, target, runner));
    }

    let candidates: Vec<&str> = if cfg!(windows) {
        match language {
            Language::C => vec!["cl", "gcc", "clang"],
            Language::Cxx => vec!["cl", "g++", "clang++"],
        }
    } else {
        match language {
            Language::C => vec!["cc"],
            Language::Cxx => vec!["c++"],
        }
    };

    for candidate in candidates {
        let path = Path::new(candidate);
        let result = if candidate == "cl" {
            msvc::probe(path, target, runner)
        } else {
            gcc::probe(path, runner)
        };
        if let Ok(info) = result {
            return Ok(info);
        }
    }

    Err(CxxpmError::CompilerNotFound {
        lang: match language {
            Language::C => "C",
            Language::Cxx => "C++",
        },
    })
}

/// Validates that every detected compiler agrees with the requested
/// target and with each other (spec §4.4 reconciliation).
pub fn reconcile(
    target: &SystemInfo,
    compilers: &[(Language, CompilerInfo)],
) -> Result<(), CxxpmError> {
    for (language, info) in compilers {
        let lang_name = match language {
            Language::C => "C",
            Language::Cxx => "C++",
        };
        if info.detected_system_name != target.target_name {
            return Err(CxxpmError::TripleMismatch {
                lang: lang_name,
                requested: target.target_name.clone(),
                detected: info.detected_system_name.clone(),
            });
        }
        let processor_ok = info.detected_system_processor == target.target_processor
            || info
                .detected_multi_arch
                .iter()
                .any(|p| p == &target.target_processor);
        if !processor_ok {
            return Err(CxxpmError::TripleMismatch {
                lang: lang_name,
                requested: target.target_processor.clone(),
                detected: info.detected_system_processor.clone(),
            });
        }
    }

    let sub_types: Vec<&Option<String>> = compilers.iter().map(|(_, i)| &i.system_sub_type).collect();
    if let Some(first) = sub_types.first() {
        if sub_types.iter().any(|s| s != first) {
            return Err(CxxpmError::TripleMismatch {
                lang: "toolchain",
                requested: format!("{:?}", first),
                detected: "conflicting sub-types across languages".to_string(),
            });
        }
    }

    let msvc_commands: Vec<&PathBuf> = compilers
        .iter()
        .filter(|(_, i)| i.compiler_type == CompilerType::Msvc)
        .map(|(_, i)| &i.command)
        .collect();
    if msvc_commands.len() > 1 && msvc_commands.iter().any(|c| *c != msvc_commands[0]) {
        return Err(CxxpmError::TripleMismatch {
            lang: "toolchain",
            requested: "a single cl.exe".to_string(),
            detected: "C and C++ resolved to different cl.exe binaries".to_string(),
        });
    }

    Ok(())
}

/// Locates a resource compiler for a Windows target built with a GNU
/// toolchain: `<compiler_dir>/windres.exe` natively, `<triple>-windres` on
/// PATH when cross-compiling.
pub fn find_resource_compiler(
    gcc_info: &CompilerInfo,
    host_name: &str,
    runner: &ProcessRunner,
) -> Option<PathBuf> {
    if host_name == "Windows" {
        let dir = gcc_info.command.parent()?;
        let candidate = dir.join("windres.exe");
        return candidate.is_file().then_some(candidate);
    }
    let name = format!("{}-windres", gcc_info.reported_target);
    runner.path_cache().resolve(Path::new(&name))
}

/// Locates the linker that matches a resolved compiler: for MSVC,
/// `link.exe` colocated with `cl.exe`; for GNU/Clang, `<triple>-ld` (or
/// plain `ld` when not cross-compiling) resolved on `PATH`.
pub fn find_linker(
    compiler_info: &CompilerInfo,
    host_name: &str,
    runner: &ProcessRunner,
) -> Option<PathBuf> {
    if compiler_info.compiler_type == CompilerType::Msvc {
        let dir = compiler_info.command.parent()?;
        let candidate = dir.join(if host_name == "Windows" { "link.exe" } else { "link" });
        return candidate.is_file().then_some(candidate);
    }

    let name = if host_name == compiler_info.detected_system_name {
        "ld".to_string()
    } else {
        format!("{}-ld", compiler_info.reported_target)
    };
    runner.path_cache().resolve(Path::new(&name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gnu_system_table_matches_spec() {
        assert_eq!(normalize_gnu_system("apple-darwin"), Some(("Darwin", "")));
        assert_eq!(normalize_gnu_system("w64-mingw32"), Some(("Windows", "mingw-w64")));
        assert_eq!(normalize_gnu_system("pc-cygwin"), Some(("Windows", "cygwin")));
        assert_eq!(normalize_gnu_system("linux-gnu"), Some(("Linux", "")));
        assert_eq!(normalize_gnu_system("solaris"), None);
    }

    #[test]
    fn processor_round_trip_for_bidirectional_pairs() {
        assert_eq!(normalize_gnu_processor("arm64"), "aarch64");
        assert_eq!(denormalize_to_gnu_processor("aarch64"), Some("arm64"));
        assert_eq!(normalize_gnu_processor("i686"), "x86");
        assert_eq!(denormalize_to_gnu_processor("x86"), Some("i686"));
    }

    #[test]
    fn non_bidirectional_processor_rows_do_not_invert() {
        assert_eq!(normalize_gnu_processor("i386"), "x86");
        // i386 and i486/i586 all collapse to x86, which does not invert
        // back to any single GNU spelling.
        assert_eq!(denormalize_to_gnu_processor("x86"), Some("i686"));
    }
}
