//! Package identity: name, on-disk layout, and the content-addressed
//! install prefix filled in once the toolchain is known.

use std::path::{Path, PathBuf};

use super::Language;

#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub path: PathBuf,
    pub extra_search_paths: Vec<PathBuf>,
    pub version: String,
    pub is_binary: bool,
    pub languages: Vec<Language>,
    pub build_file: PathBuf,
    pub prefix: Option<PathBuf>,
    /// Off by default: the original reads `DEFAULT_VERSION`/`<version>.build`
    /// for each configured extra search directory by re-checking the
    /// package's own root instead of that directory, so extra directories
    /// never actually contribute a file the root doesn't already have. Set
    /// via `--fix-extra-search-dirs` to use the corrected per-directory
    /// lookup instead.
    pub use_correct_extra_dirs: bool,
}

impl Package {
    /// A package stub known only by name and root path; `inspect` fills in
    /// version/build_file/languages/is_binary afterwards.
    pub fn stub(name: &str, path: PathBuf) -> Self {
        Package {
            name: name.to_string(),
            path,
            extra_search_paths: Vec::new(),
            version: String::new(),
            is_binary: false,
            languages: Vec::new(),
            build_file: PathBuf::new(),
            prefix: None,
            use_correct_extra_dirs: false,
        }
    }

    pub fn meta_build_path(&self) -> PathBuf {
        self.path.join("meta.build")
    }

    pub fn version_build_path(&self, version: &str) -> PathBuf {
        self.path.join(format!("{version}.build"))
    }

    /// Searches this package's root plus its extra search paths for
    /// `<name>`, e.g. `<version>.build`. Reproduces the original's
    /// extra-directory bug by default (see `use_correct_extra_dirs`).
    pub fn find_in_search_paths(&self, filename: &str) -> Option<PathBuf> {
        if self.use_correct_extra_dirs {
            std::iter::once(&self.path)
                .chain(self.extra_search_paths.iter())
                .map(|dir| dir.join(filename))
                .find(|p| p.is_file())
        } else {
            std::iter::once(&self.path)
                .chain(self.extra_search_paths.iter().map(|_| &self.path))
                .map(|dir| dir.join(filename))
                .find(|p| p.is_file())
        }
    }

    pub fn set_prefix(&mut self, prefix: PathBuf) {
        self.prefix = Some(prefix);
    }

    pub fn prefix(&self) -> &Path {
        self.prefix
            .as_deref()
            .expect("Package::prefix called before updatePrefix")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_path_prefers_root_then_extras() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = tmp.path().join("root");
        let extra = tmp.path().join("extra");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(&extra).unwrap();
        std::fs::write(extra.join("1.0.build"), "").unwrap();

        let mut pkg = Package::stub("hw", root);
        pkg.extra_search_paths.push(extra.clone());
        pkg.use_correct_extra_dirs = true;

        assert_eq!(
            pkg.find_in_search_paths("1.0.build"),
            Some(extra.join("1.0.build"))
        );
    }

    #[test]
    fn search_path_default_reproduces_extra_dir_bug() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = tmp.path().join("root");
        let extra = tmp.path().join("extra");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(&extra).unwrap();
        std::fs::write(extra.join("1.0.build"), "").unwrap();

        let mut pkg = Package::stub("hw", root);
        pkg.extra_search_paths.push(extra);

        assert_eq!(pkg.find_in_search_paths("1.0.build"), None);
    }

    #[test]
    #[should_panic(expected = "before updatePrefix")]
    fn prefix_panics_before_assignment() {
        let pkg = Package::stub("hw", PathBuf::from("/tmp/hw"));
        let _ = pkg.prefix();
    }
}
