//! Data model: compiler/system identity, packages, and artifacts.

pub mod artifact;
pub mod package;

pub use artifact::{Artifact, RawArtifact};
pub use package::Package;

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Cxx,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::C => "C",
            Language::Cxx => "CXX",
        }
    }

    pub fn parse(s: &str) -> Option<Language> {
        match s.trim() {
            "C" => Some(Language::C),
            "C++" | "CXX" => Some(Language::Cxx),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerType {
    Gcc,
    Clang,
    Msvc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolType {
    Linker,
    ResourceCompiler,
}

/// One configured→canonical build-type mapping entry (spec §8's
/// build-type-mapping property).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildType {
    pub configured_name: String,
    pub mapped_to: String,
}

/// Parses `"Debug:Debug;*:Release"` mapping-rule syntax against the list of
/// requested configured names, e.g. `"Debug;Release;Profile"`. Exactly one
/// `*:` default rule is allowed.
pub fn parse_build_type_mapping(
    rules: &str,
    requested: &str,
) -> anyhow::Result<Vec<BuildType>> {
    use crate::util::strtools::split_delimited;

    let mut exact: std::collections::HashMap<String, String> = std::collections::HashMap::new();
    let mut default: Option<String> = None;

    for rule in split_delimited(rules, ";") {
        let Some((from, to)) = rule.split_once(':') else {
            anyhow::bail!("malformed build-type mapping rule: `{rule}`");
        };
        if from == "*" {
            if default.is_some() {
                anyhow::bail!("build-type mapping has more than one default (`*:`) rule");
            }
            default = Some(to.to_string());
        } else {
            exact.insert(from.to_string(), to.to_string());
        }
    }

    split_delimited(requested, ";")
        .into_iter()
        .map(|name| {
            let mapped_to = exact
                .get(name)
                .cloned()
                .or_else(|| default.clone())
                .ok_or_else(|| anyhow::anyhow!("no mapping and no default for build type `{name}`"))?;
            Ok(BuildType {
                configured_name: name.to_string(),
                mapped_to,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct CompilerInfo {
    pub command: PathBuf,
    pub id: String,
    pub compiler_type: CompilerType,
    pub detected_system_name: String,
    pub detected_system_processor: String,
    pub detected_multi_arch: Vec<String>,
    pub system_sub_type: Option<String>,
    pub reported_target: String,
}

#[derive(Debug, Clone, Default)]
pub struct SystemInfo {
    pub host_name: String,
    pub host_processor: String,
    pub target_name: String,
    pub target_processor: String,
    pub target_sub_type: Option<String>,
    pub build_types: Vec<BuildType>,
    pub msvc_install_dir: Option<PathBuf>,
    pub msvc_toolset_name: Option<String>,
    pub msvc_toolset_version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_type_mapping_matches_spec_example() {
        let mapping =
            parse_build_type_mapping("Debug:Debug;*:Release", "Debug;Release;Profile").unwrap();
        assert_eq!(
            mapping,
            vec![
                BuildType { configured_name: "Debug".into(), mapped_to: "Debug".into() },
                BuildType { configured_name: "Release".into(), mapped_to: "Release".into() },
                BuildType { configured_name: "Profile".into(), mapped_to: "Release".into() },
            ]
        );
    }

    #[test]
    fn build_type_mapping_rejects_two_defaults() {
        let result = parse_build_type_mapping("*:Release;*:Debug", "Debug");
        assert!(result.is_err());
    }

    #[test]
    fn build_type_mapping_without_default_fails_on_unmapped_name() {
        let result = parse_build_type_mapping("Debug:Debug", "Debug;Release");
        assert!(result.is_err());
    }
}
