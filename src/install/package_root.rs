//! Resolves package names to on-disk package directories under
//! `<package-root>/packages/<name>/` and reads `meta.build`/`<version>.build`.

use std::path::{Path, PathBuf};

use crate::error::CxxpmError;
use crate::model::{Language, Package};
use crate::util::process::ProcessRunner;

use super::shellvars::read_var;

pub struct PackageRoot {
    pub root: PathBuf,
    pub extra_dirs: Vec<PathBuf>,
    /// See `Package::use_correct_extra_dirs`; propagated to every package
    /// this root loads.
    pub fix_extra_search_dirs: bool,
}

impl PackageRoot {
    pub fn new(root: PathBuf) -> Self {
        PackageRoot {
            root,
            extra_dirs: Vec::new(),
            fix_extra_search_dirs: false,
        }
    }

    fn package_dir(&self, name: &str) -> PathBuf {
        self.root.join("packages").join(name)
    }

    /// Loads `name`, filling in version (from `meta.build`'s
    /// `DEFAULT_VERSION` unless the caller pins one), `build_file`,
    /// `languages`, and `is_binary`.
    pub fn load(
        &self,
        name: &str,
        pinned_version: Option<&str>,
        runner: &ProcessRunner,
    ) -> Result<Package, CxxpmError> {
        let dir = self.package_dir(name);
        if !dir.is_dir() {
            return Err(CxxpmError::UnknownPackage(name.to_string()));
        }

        let mut pkg = Package::stub(name, dir.clone());
        pkg.extra_search_paths = self.extra_dirs.clone();
        pkg.use_correct_extra_dirs = self.fix_extra_search_dirs;

        let version = match pinned_version {
            Some(v) => v.to_string(),
            None => {
                let meta = pkg
                    .find_in_search_paths("meta.build")
                    .unwrap_or_else(|| pkg.meta_build_path());
                let default = read_var(&meta, "DEFAULT_VERSION", runner).map_err(|_| {
                    CxxpmError::MissingBuildFile {
                        name: name.to_string(),
                        version: "<default>".to_string(),
                    }
                })?;
                if default.is_empty() {
                    return Err(CxxpmError::MissingVariable {
                        name: name.to_string(),
                        var: "DEFAULT_VERSION",
                    });
                }
                default
            }
        };

        let build_file = pkg
            .find_in_search_paths(&format!("{version}.build"))
            .ok_or_else(|| CxxpmError::MissingBuildFile {
                name: name.to_string(),
                version: version.clone(),
            })?;

        let package_type = read_var(&build_file, "PACKAGE_TYPE", runner)
            .unwrap_or_default();
        let langs_raw = read_var(&build_file, "LANGS", runner).unwrap_or_default();
        let languages = crate::util::strtools::split_delimited(&langs_raw, ",")
            .into_iter()
            .filter_map(Language::parse)
            .collect();

        pkg.version = version;
        pkg.build_file = build_file;
        pkg.is_binary = package_type.trim() == "binary";
        pkg.languages = languages;

        Ok(pkg)
    }

    pub fn dependencies(&self, pkg: &Package, runner: &ProcessRunner) -> Result<Vec<String>, CxxpmError> {
        // DEPENDS is a bare whitespace-separated package-name list; no
        // version-constraint syntax is parsed here, intentionally, matching
        // the original build-file format.
        let raw = read_var(&pkg.build_file, "DEPENDS", runner).unwrap_or_default();
        Ok(crate::util::strtools::split_whitespace_collapsed(&raw)
            .into_iter()
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_fixture(root: &Path) {
        let pkg_dir = root.join("packages").join("hw");
        std::fs::create_dir_all(&pkg_dir).unwrap();
        std::fs::write(pkg_dir.join("meta.build"), "DEFAULT_VERSION=1.0\n").unwrap();
        std::fs::write(
            pkg_dir.join("1.0.build"),
            "PACKAGE_TYPE=source\nLANGS=C\nDEPENDS=\n",
        )
        .unwrap();
    }

    #[test]
    fn load_reads_default_version_and_metadata() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_fixture(tmp.path());

        let cache = crate::util::PathCache::new();
        let runner = ProcessRunner::new(&cache);
        let pkg_root = PackageRoot::new(tmp.path().to_path_buf());
        let pkg = pkg_root.load("hw", None, &runner).unwrap();

        assert_eq!(pkg.version, "1.0");
        assert!(!pkg.is_binary);
        assert_eq!(pkg.languages, vec![Language::C]);
    }

    #[test]
    fn load_unknown_package_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = crate::util::PathCache::new();
        let runner = ProcessRunner::new(&cache);
        let pkg_root = PackageRoot::new(tmp.path().to_path_buf());
        let result = pkg_root.load("nonexistent", None, &runner);
        assert!(matches!(result, Err(CxxpmError::UnknownPackage(_))));
    }
}
