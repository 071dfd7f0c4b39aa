//! MSVC probe: environment bootstrap via `vcvarsall.bat` and `cl` banner
//! parsing (spec §4.4, §9).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::CxxpmError;
use crate::model::{CompilerInfo, CompilerType, SystemInfo};
use crate::util::path_cache::PathCache;
use crate::util::process::ProcessRunner;

/// Host x target -> vcvarsall argument (spec §4.4 closed matrix).
fn vcvars_arg(host: &str, target: &str) -> Option<&'static str> {
    Some(match (host, target) {
        ("x86", "x86") => "x86",
        ("x86", "x86_64") => "x86_x64",
        ("x86", "aarch64") => "x86_arm64",
        ("x86_64", "x86") => "x64_x86",
        ("x86_64", "x86_64") => "x64",
        ("x86_64", "aarch64") => "x64_arm64",
        ("aarch64", "x86") => "x64_x86",
        ("aarch64", "x86_64") => "x64",
        ("aarch64", "aarch64") => "x64_arm64",
        _ => return None,
    })
}

/// True when the process is already inside a Developer Command Prompt.
fn env_already_initialized() -> bool {
    std::env::var("VSINSTALLDIR").is_ok()
        && std::env::var("INCLUDE").is_ok()
        && std::env::var("LIB").is_ok()
}

/// Runs `vcvarsall.bat <arg>` inside a temporary wrapper batch file (to
/// dodge cmd.exe quoting pitfalls) and re-imports every `NAME=VALUE` line
/// from `SET` into the current process. Mutates `PATH`; callers must call
/// [`PathCache::update`] immediately afterward.
pub fn bootstrap_msvc_env(
    vcvarsall: &Path,
    host_processor: &str,
    target_processor: &str,
    path_cache: &PathCache,
) -> Result<(), CxxpmError> {
    if env_already_initialized() {
        return Ok(());
    }

    if let Ok(preinit) = std::env::var("__VSCMD_PREINIT_PATH") {
        std::env::set_var("PATH", preinit);
    }

    let arg = vcvars_arg(host_processor, target_processor).ok_or_else(|| {
        CxxpmError::MsvcBootstrap {
            vcvarsall: vcvarsall.to_path_buf(),
        }
    })?;

    let wrapper = tempfile::Builder::new()
        .suffix(".bat")
        .tempfile()
        .map_err(|_| CxxpmError::MsvcBootstrap {
            vcvarsall: vcvarsall.to_path_buf(),
        })?;
    let script = format!("@echo off\r\ncall \"{}\" {}\r\nset\r\n", vcvarsall.display(), arg);
    std::fs::write(wrapper.path(), script).map_err(|_| CxxpmError::MsvcBootstrap {
        vcvarsall: vcvarsall.to_path_buf(),
    })?;

    let output = std::process::Command::new("cmd")
        .arg("/c")
        .arg(wrapper.path())
        .output()
        .map_err(|_| CxxpmError::MsvcBootstrap {
            vcvarsall: vcvarsall.to_path_buf(),
        })?;

    if !output.status.success() {
        return Err(CxxpmError::MsvcBootstrap {
            vcvarsall: vcvarsall.to_path_buf(),
        });
    }

    let vars = parse_set_output(&String::from_utf8_lossy(&output.stdout));
    for (k, v) in vars {
        std::env::set_var(k, v);
    }

    path_cache.update();
    Ok(())
}

fn parse_set_output(stdout: &str) -> HashMap<String, String> {
    stdout
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Probes `cl` after ensuring the environment is bootstrapped. `command`
/// is used only to confirm the caller asked for MSVC (typically `"cl"`);
/// the actual binary run is whatever `cl` resolves to once the
/// environment is set up.
pub fn probe(
    command: &Path,
    target: &SystemInfo,
    runner: &ProcessRunner,
) -> Result<CompilerInfo, CxxpmError> {
    if command.file_stem().and_then(|s| s.to_str()) != Some("cl") {
        return Err(CxxpmError::CompilerNotFound { lang: "C/C++" });
    }

    if !env_already_initialized() {
        if let Some(vs_dir) = &target.msvc_install_dir {
            let vcvarsall = vs_dir.join("VC").join("Auxiliary").join("Build").join("vcvarsall.bat");
            bootstrap_msvc_env(
                &vcvarsall,
                &target.host_processor,
                &target.target_processor,
                runner.path_cache(),
            )?;
        } else {
            return Err(CxxpmError::CompilerNotFound { lang: "C/C++" });
        }
    }

    let output = runner
        .run(&std::env::current_dir().unwrap_or_else(|_| ".".into()), Path::new("cl"), &[], &[], false)
        .map_err(|_| CxxpmError::CompilerNotFound { lang: "C/C++" })?;

    let first_line = output.stderr.lines().next().unwrap_or_default();
    let tokens: Vec<&str> = first_line.split_whitespace().collect();

    let has_all = tokens.contains(&"Microsoft") && tokens.contains(&"(R)") && tokens.contains(&"C/C++");
    if !has_all || tokens.len() < 3 {
        return Err(CxxpmError::CompilerNotFound { lang: "C/C++" });
    }

    let arch_raw = tokens[tokens.len() - 1];
    let version = tokens[tokens.len() - 3];
    let arch = normalize_msvc_arch(arch_raw);

    Ok(CompilerInfo {
        command: output.full_path,
        id: format!("cl-{arch}-{version}"),
        compiler_type: CompilerType::Msvc,
        detected_system_name: "Windows".to_string(),
        detected_system_processor: arch,
        detected_multi_arch: Vec::new(),
        system_sub_type: Some("msvc".to_string()),
        reported_target: arch_raw.to_string(),
    })
}

fn normalize_msvc_arch(raw: &str) -> String {
    match raw {
        "x64" => "x86_64".to_string(),
        "x86" => "x86".to_string(),
        "ARM64" | "arm64" => "aarch64".to_string(),
        other => other.to_string(),
    }
}

/// `-DCMAKE_GENERATOR_PLATFORM` value for a normalized processor.
pub fn cmake_generator_platform(normalized_processor: &str) -> Option<&'static str> {
    match normalized_processor {
        "x86" => Some("Win32"),
        "x86_64" => Some("x64"),
        "aarch64" => Some("ARM64"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vcvars_matrix_matches_spec() {
        assert_eq!(vcvars_arg("x86", "x86_64"), Some("x86_x64"));
        assert_eq!(vcvars_arg("x86_64", "x86"), Some("x64_x86"));
        assert_eq!(vcvars_arg("aarch64", "aarch64"), Some("x64_arm64"));
    }

    #[test]
    fn generator_platform_mapping() {
        assert_eq!(cmake_generator_platform("x86"), Some("Win32"));
        assert_eq!(cmake_generator_platform("x86_64"), Some("x64"));
        assert_eq!(cmake_generator_platform("aarch64"), Some("ARM64"));
    }

    #[test]
    fn msvc_arch_normalization() {
        assert_eq!(normalize_msvc_arch("x64"), "x86_64");
        assert_eq!(normalize_msvc_arch("ARM64"), "aarch64");
    }

    #[test]
    fn parse_set_output_reads_name_value_pairs() {
        let parsed = parse_set_output("PATH=C:\\a;C:\\b\r\nINCLUDE=C:\\inc\r\n");
        assert_eq!(parsed.get("INCLUDE").unwrap(), "C:\\inc");
    }
}
