//! Command-line surface (spec §6): one of three mutually exclusive modes,
//! plus a closed set of modifier flags. Brought in-scope over the
//! distilled design so the binary doesn't need a second option parser.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "cxxpm", version, about = "A source-and-binary C/C++ package manager")]
pub struct Cli {
    #[command(flatten)]
    pub mode: ModeArgs,

    /// `C:<path>` or `C++:<path>`; may be given once per language.
    #[arg(long = "compiler")]
    pub compiler: Vec<String>,

    #[arg(long = "system-name")]
    pub system_name: Option<String>,

    #[arg(long = "system-processor")]
    pub system_processor: Option<String>,

    /// Semicolon-separated list, e.g. `Debug;Release`.
    #[arg(long = "build-type", default_value = "Release")]
    pub build_type: String,

    /// `Debug:Debug;*:Release` syntax; exactly one default (`*:`) rule.
    #[arg(long = "build-type-mapping")]
    pub build_type_mapping: Option<String>,

    #[arg(long = "vs-install-dir")]
    pub vs_install_dir: Option<PathBuf>,

    #[arg(long = "vc-toolset")]
    pub vc_toolset: Option<String>,

    #[arg(long = "package-root")]
    pub package_root: Option<PathBuf>,

    #[arg(long = "package-extra-dir")]
    pub package_extra_dir: Vec<PathBuf>,

    /// Use the corrected per-directory lookup for `--package-extra-dir`
    /// instead of reproducing the original's extra-directory bug (see
    /// DESIGN.md).
    #[arg(long = "fix-extra-search-dirs")]
    pub fix_extra_search_dirs: bool,

    #[arg(long, short = 'v')]
    pub verbose: bool,

    #[arg(long = "home")]
    pub home: Option<PathBuf>,

    #[command(subcommand)]
    pub hidden_command: Option<HiddenCommand>,
}

#[derive(Debug, Args)]
#[group(required = false, multiple = false)]
pub struct ModeArgs {
    #[arg(long = "package-list")]
    pub package_list: bool,

    #[arg(long = "search-path", value_name = "NAME")]
    pub search_path: Option<String>,

    #[arg(long = "install", value_name = "NAME")]
    pub install: Option<String>,

    /// Only meaningful with `--search-path`.
    #[arg(long = "file", value_name = "SUFFIX", requires = "search_path")]
    pub file: Option<String>,

    /// Only meaningful with `--search-path`.
    #[arg(
        long = "search-path-type",
        value_parser = ["native", "posix", "cmake"],
        default_value = "native",
        requires = "search_path"
    )]
    pub search_path_type: String,

    /// Only meaningful with `--install`.
    #[arg(long = "export-cmake", value_name = "OUTPUT", requires = "install")]
    pub export_cmake: Option<PathBuf>,
}

/// Not part of the three flat modes; kept as a subcommand so it stays
/// out of `--help`'s main usage line.
#[derive(Debug, Subcommand)]
pub enum HiddenCommand {
    #[command(hide = true)]
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn install_and_package_list_are_mutually_exclusive() {
        let result = Cli::try_parse_from(["cxxpm", "--install", "hw", "--package-list"]);
        assert!(result.is_err());
    }

    #[test]
    fn install_alone_parses() {
        let cli = Cli::try_parse_from(["cxxpm", "--install", "hw"]).unwrap();
        assert_eq!(cli.mode.install.as_deref(), Some("hw"));
    }
}
