//! Structured error kinds for the install/export core.
//!
//! Each variant corresponds to one of the error-handling policies: fatal
//! kinds propagate via `?` and terminate the process with exit code 1;
//! `ManifestWarning` is deliberately not fatal (see its doc comment).

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CxxpmError {
    #[error("bad command line: {0}")]
    #[diagnostic(code(cxxpm::config))]
    Configuration(String),

    #[error("no usable {lang} compiler found")]
    #[diagnostic(code(cxxpm::toolchain::not_found))]
    CompilerNotFound { lang: &'static str },

    #[error(
        "target processor is {requested}, but {lang} compiler target is {detected}"
    )]
    #[diagnostic(
        code(cxxpm::toolchain::triple_mismatch),
        help("pass --system-processor matching the compiler, or point --compiler at a cross toolchain")
    )]
    TripleMismatch {
        lang: &'static str,
        requested: String,
        detected: String,
    },

    #[error("MSVC environment could not be bootstrapped from {vcvarsall}")]
    #[diagnostic(code(cxxpm::toolchain::msvc_bootstrap))]
    MsvcBootstrap { vcvarsall: PathBuf },

    #[error("unknown package `{0}`")]
    #[diagnostic(code(cxxpm::package::unknown))]
    UnknownPackage(String),

    #[error("package `{name}` has no build file for version {version}")]
    #[diagnostic(code(cxxpm::package::missing_build_file))]
    MissingBuildFile { name: String, version: String },

    #[error("package `{name}` build file is missing required variable `{var}`")]
    #[diagnostic(code(cxxpm::package::missing_variable))]
    MissingVariable { name: String, var: &'static str },

    #[error("SHA3 mismatch for {path}: expected {expected}, got {actual}")]
    #[diagnostic(code(cxxpm::fetch::hash_mismatch))]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("unknown archive type for {0}")]
    #[diagnostic(code(cxxpm::fetch::unknown_archive))]
    UnknownArchiveType(PathBuf),

    #[error("git clone/checkout failed for {0}")]
    #[diagnostic(code(cxxpm::fetch::git_failed))]
    GitOperationFailed(PathBuf),

    #[error("build script exited with a non-zero status, see {log}")]
    #[diagnostic(code(cxxpm::build::failed))]
    BuildFailed { log: PathBuf },

    #[error("invalid artifact JSON: {0}")]
    #[diagnostic(code(cxxpm::artifact::json))]
    ArtifactJson(String),

    #[error(
        "{prev} and {curr} configurations have a different number of artifacts, aborting"
    )]
    #[diagnostic(code(cxxpm::artifact::count_mismatch))]
    ArtifactCountMismatch { prev: String, curr: String },

    #[error("artifact `{name}` could not be merged across configurations: {reason}")]
    #[diagnostic(code(cxxpm::artifact::merge))]
    ArtifactMerge { name: String, reason: String },

    #[error("artifact file does not exist: {0}")]
    #[diagnostic(code(cxxpm::artifact::missing_file))]
    ArtifactMissingFile(PathBuf),

    #[error("library `{lib_name}` requires non-existing include directory `{include_name}`")]
    #[diagnostic(code(cxxpm::artifact::dangling_include))]
    DanglingIncludeLink {
        lib_name: String,
        include_name: String,
    },

    #[error("libset `{libset_name}` references non-existent library `{lib_name}`")]
    #[diagnostic(code(cxxpm::artifact::dangling_libset))]
    DanglingLibsetEntry {
        libset_name: String,
        lib_name: String,
    },

    #[error("{0} matches zero or more than one entry in the manifest")]
    #[diagnostic(code(cxxpm::search_path::ambiguous))]
    SearchPathAmbiguous(String),

    #[error(transparent)]
    #[diagnostic(code(cxxpm::io))]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CxxpmError>;
