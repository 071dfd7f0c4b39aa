//! Reads variables out of a package's `.build` shell fragment by sourcing
//! it in a throwaway `bash` subshell and printing the variable — this
//! module never parses shell syntax itself (spec §9).

use std::path::Path;

use anyhow::{Context, Result};

use crate::error::CxxpmError;
use crate::util::process::ProcessRunner;

/// Sources `build_file` and prints `var`'s value (empty string if unset).
pub fn read_var(build_file: &Path, var: &str, runner: &ProcessRunner) -> Result<String> {
    let script = format!(
        "set -e; source \"{}\"; printf '%s' \"${{{}:-}}\"",
        build_file.display(),
        var
    );
    let output = runner
        .run(
            build_file.parent().unwrap_or_else(|| Path::new(".")),
            Path::new("bash"),
            &["-c".to_string(), script],
            &[],
            true,
        )
        .with_context(|| format!("failed to read `{var}` from {}", build_file.display()))?;
    Ok(output.stdout)
}

/// Sources `build_file` and calls the named shell function (`build` or
/// `artifacts`), teeing output through the given `ProcessRunner` mode.
pub fn call_function_captured(
    build_file: &Path,
    function: &str,
    cwd: &Path,
    extra_env: &[String],
    runner: &ProcessRunner,
) -> Result<(bool, String), CxxpmError> {
    let script = format!(
        "set -x; set -e; source \"{}\"; {function};",
        build_file.display()
    );
    let output = runner
        .run(cwd, Path::new("bash"), &["-c".to_string(), script], extra_env, true)
        .map_err(|_| CxxpmError::BuildFailed {
            log: cwd.join("build.log"),
        })?;
    Ok((output.success, output.stdout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_var_returns_exported_value() {
        let tmp = tempfile::TempDir::new().unwrap();
        let build_file = tmp.path().join("1.0.build");
        std::fs::write(&build_file, "DEFAULT_VERSION=1.0\n").unwrap();

        let cache = crate::util::PathCache::new();
        let runner = ProcessRunner::new(&cache);
        let value = read_var(&build_file, "DEFAULT_VERSION", &runner).unwrap();
        assert_eq!(value, "1.0");
    }

    #[test]
    fn read_var_missing_is_empty_string() {
        let tmp = tempfile::TempDir::new().unwrap();
        let build_file = tmp.path().join("1.0.build");
        std::fs::write(&build_file, "FOO=bar\n").unwrap();

        let cache = crate::util::PathCache::new();
        let runner = ProcessRunner::new(&cache);
        let value = read_var(&build_file, "DEPENDS", &runner).unwrap();
        assert_eq!(value, "");
    }
}
