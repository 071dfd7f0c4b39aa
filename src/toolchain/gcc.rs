//! GNU/Clang banner probe and the Darwin multi-arch trial-compile probe.

use std::path::Path;

use crate::error::CxxpmError;
use crate::model::{CompilerInfo, CompilerType};
use crate::util::process::ProcessRunner;

use super::{normalize_gnu_processor, normalize_gnu_system};

/// Runs `<command> -v` (a version-dump flag every GNU/Clang front-end
/// accepts), then scans stderr for a `Target: <triple>` line and a line
/// whose whole text is the banner carrying the literal token `gcc` or
/// `clang`.
pub fn probe(command: &Path, runner: &ProcessRunner) -> Result<CompilerInfo, CxxpmError> {
    let output = runner
        .run(
            &std::env::current_dir().unwrap_or_else(|_| ".".into()),
            command,
            &["-v".to_string()],
            &[],
            false,
        )
        .map_err(|_| CxxpmError::CompilerNotFound { lang: "C/C++" })?;

    if output.full_path.as_os_str().is_empty() {
        return Err(CxxpmError::CompilerNotFound { lang: "C/C++" });
    }

    let mut target: Option<String> = None;
    let mut banner: Option<String> = None;

    for line in output.stderr.lines() {
        if let Some(rest) = line.strip_prefix("Target: ") {
            target = Some(rest.trim().to_string());
            continue;
        }
        let lower = line.to_ascii_lowercase();
        if lower.contains("gcc") || lower.contains("clang") {
            banner = Some(line.trim_end().to_string());
        }
    }

    let target = target.ok_or(CxxpmError::CompilerNotFound { lang: "C/C++" })?;
    let banner = banner.ok_or(CxxpmError::CompilerNotFound { lang: "C/C++" })?;

    let compiler_type = if banner.to_ascii_lowercase().contains("clang") {
        CompilerType::Clang
    } else {
        CompilerType::Gcc
    };

    let (processor_raw, system_suffix) = target
        .split_once('-')
        .ok_or(CxxpmError::CompilerNotFound { lang: "C/C++" })?;
    let processor = normalize_gnu_processor(processor_raw);
    let (system_name, sub_type) = normalize_gnu_system(system_suffix)
        .unwrap_or(("Unknown", ""));

    let id = format!("{banner}-{target}");

    let mut info = CompilerInfo {
        command: output.full_path,
        id,
        compiler_type,
        detected_system_name: system_name.to_string(),
        detected_system_processor: processor,
        detected_multi_arch: Vec::new(),
        system_sub_type: if sub_type.is_empty() {
            None
        } else {
            Some(sub_type.to_string())
        },
        reported_target: target,
    };

    if compiler_type == CompilerType::Clang && system_name == "Darwin" {
        info.detected_multi_arch = darwin_multi_arch_probe(&info.command, runner);
    }

    Ok(info)
}

/// Trial-compiles a trivial `main` with `-arch arm64`, `-arch x86_64`,
/// `-arch x86` in turn; architectures that compile are recorded.
fn darwin_multi_arch_probe(clang: &Path, runner: &ProcessRunner) -> Vec<String> {
    let Ok(tmp) = tempfile::NamedTempFile::with_suffix(".c") else {
        return Vec::new();
    };
    if std::fs::write(tmp.path(), "int main(void) { return 0; }\n").is_err() {
        return Vec::new();
    }

    let out_path = tmp.path().with_extension("out");
    let mut found = Vec::new();
    for (flag_arch, normalized) in [("arm64", "aarch64"), ("x86_64", "x86_64"), ("x86", "x86")] {
        let args = vec![
            "-arch".to_string(),
            flag_arch.to_string(),
            tmp.path().to_string_lossy().into_owned(),
            "-o".to_string(),
            out_path.to_string_lossy().into_owned(),
        ];
        let ok = runner
            .run(&std::env::temp_dir(), clang, &args, &[], true)
            .map(|r| r.success)
            .unwrap_or(false);
        if ok {
            found.push(normalized.to_string());
        }
    }
    let _ = std::fs::remove_file(&out_path);
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_missing_compiler_is_not_found() {
        let cache = crate::util::PathCache::new();
        let runner = ProcessRunner::new(&cache);
        let result = probe(Path::new("__no_such_compiler__"), &runner);
        assert!(result.is_err());
    }
}
