//! Global runtime context: the `<home>` directory layout and the shared
//! [`PathCache`] every [`crate::util::process::ProcessRunner`] resolves
//! executables through.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use super::path_cache::PathCache;

static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("", "", "cxxpm"));

/// `<home>` defaults to `~/.cxxpm`, overridable by the CLI's `--home`.
///
/// Subtrees:
/// - `distr/` — download cache, keyed by package name
/// - `self/packages/` — default package root (build-file search path)
/// - `.s`, `.b` — ephemeral per-install build scratch directories
/// - `<toolchain-id>/<name>/<version>-<build_type>-<package_id>/` — source installs
/// - `binary-packages/<name>-<version>/` — binary installs
#[derive(Debug)]
pub struct GlobalContext {
    home: PathBuf,
    verbose: bool,
    path_cache: PathCache,
}

impl GlobalContext {
    pub fn new(home_override: Option<PathBuf>) -> Result<Self> {
        let home = match home_override {
            Some(h) => h,
            None => default_home()?,
        };

        Ok(GlobalContext {
            home,
            verbose: false,
            path_cache: PathCache::new(),
        })
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn path_cache(&self) -> &PathCache {
        &self.path_cache
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn distr_dir(&self) -> PathBuf {
        self.home.join("distr")
    }

    pub fn default_package_root(&self) -> PathBuf {
        self.home.join("self").join("packages")
    }

    pub fn scratch_source_dir(&self) -> PathBuf {
        self.home.join(".s")
    }

    pub fn scratch_build_dir(&self) -> PathBuf {
        self.home.join(".b")
    }

    pub fn binary_package_dir(&self, name: &str, version: &str) -> PathBuf {
        self.home
            .join("binary-packages")
            .join(format!("{name}-{version}"))
    }

    /// `<home>/<toolchain_id>/<name>/<version>-<build_type>-<package_id>`
    pub fn install_prefix(
        &self,
        toolchain_id: &str,
        name: &str,
        version: &str,
        build_type: &str,
        package_id: &str,
    ) -> PathBuf {
        self.home.join(toolchain_id).join(name).join(format!(
            "{version}-{build_type}-{package_id}"
        ))
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    pub fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::create_dir_all(path)
                .with_context(|| format!("failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }
}

fn default_home() -> Result<PathBuf> {
    if let Some(dirs) = PROJECT_DIRS.as_ref() {
        // `ProjectDirs` gives us a platform cache dir; cxxpm wants a single
        // dotfile-style home regardless of platform, so fall through to the
        // plain `~/.cxxpm` convention instead of dirs' per-OS conventions.
        let _ = dirs;
    }
    let home_dir = directories::UserDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .context("could not determine the user's home directory")?;
    Ok(home_dir.join(".cxxpm"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_spec_paths() {
        let ctx = GlobalContext::new(Some(PathBuf::from("/tmp/fake-home"))).unwrap();
        assert_eq!(ctx.distr_dir(), PathBuf::from("/tmp/fake-home/distr"));
        assert_eq!(
            ctx.default_package_root(),
            PathBuf::from("/tmp/fake-home/self/packages")
        );
        assert_eq!(
            ctx.binary_package_dir("zlib", "1.3"),
            PathBuf::from("/tmp/fake-home/binary-packages/zlib-1.3")
        );
        assert_eq!(
            ctx.install_prefix("abc123", "zlib", "1.3", "release", "def456"),
            PathBuf::from("/tmp/fake-home/abc123/zlib/1.3-release-def456")
        );
    }

    #[test]
    fn default_home_is_dotfile_under_user_home() {
        let home = default_home().unwrap();
        assert!(home.ends_with(".cxxpm"));
    }
}
