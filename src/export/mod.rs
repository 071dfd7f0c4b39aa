//! Exporter: multi-configuration artifact inspection, merge, and
//! consumer-glue generation (spec §4.8).

pub mod cmake_glue;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::CxxpmError;
use crate::model::artifact::{merge_configurations, Artifact, RawArtifact};

/// One configuration's artifacts JSON plus the install prefix it was
/// produced under (needed to resolve relative artifact paths for the
/// on-disk existence check).
pub struct ConfigArtifacts {
    pub configured_name: String,
    pub prefix: PathBuf,
    pub raw_json: String,
}

pub struct Exporter {
    pub package_name: String,
    pub configs: Vec<ConfigArtifacts>,
    /// `SystemInfo::target_name` of the build this export is for — the
    /// platform the artifacts run on, not the platform cxxpm itself runs
    /// on. Drives the shared-library `dll`/`implib` vs. plain-path choice
    /// below and in `cmake_glue::emit_artifact`.
    pub target_system_name: String,
}

impl Exporter {
    pub fn export(&self) -> Result<String, CxxpmError> {
        let mut per_config_artifacts = Vec::new();
        for config in &self.configs {
            let parsed: Vec<RawArtifact> = serde_json::from_str(&config.raw_json)
                .map_err(|e| CxxpmError::ArtifactJson(e.to_string()))?;
            per_config_artifacts.push(parsed);
        }

        if per_config_artifacts.iter().any(|c| c.len() != per_config_artifacts[0].len()) {
            return Err(CxxpmError::ArtifactCountMismatch {
                prev: "configuration 0".to_string(),
                curr: "a later configuration".to_string(),
            });
        }

        let merged = merge_configurations(per_config_artifacts)?;
        self.check_files_exist(&merged)?;

        let configured_names: Vec<String> =
            self.configs.iter().map(|c| c.configured_name.clone()).collect();
        let lib_whitelist: HashSet<String> = merged
            .iter()
            .filter(|a| {
                matches!(a, Artifact::StaticLibrary { .. } | Artifact::SharedLibrary { .. })
            })
            .map(|a| a.name().to_string())
            .collect();

        let mut out = cmake_glue::emit_header(&self.package_name, &configured_names);
        for artifact in &merged {
            out.push_str(&cmake_glue::emit_artifact(
                artifact,
                &configured_names,
                &merged,
                &lib_whitelist,
                &self.target_system_name,
            )?);
        }
        Ok(out)
    }

    fn check_files_exist(&self, merged: &[Artifact]) -> Result<(), CxxpmError> {
        let is_windows_target = self.target_system_name == "Windows";
        for artifact in merged {
            let relative_paths: Vec<&str> = match artifact {
                Artifact::IncludeDirectory { paths, .. } => paths.iter().map(String::as_str).collect(),
                Artifact::StaticLibrary { paths, .. } => paths.iter().map(String::as_str).collect(),
                Artifact::SharedLibrary { dll_paths, implib_paths, paths, .. } => {
                    if is_windows_target {
                        dll_paths.iter().chain(implib_paths).map(String::as_str).collect()
                    } else {
                        paths.iter().map(String::as_str).collect()
                    }
                }
                Artifact::Executable { paths, .. } => paths.iter().map(String::as_str).collect(),
                Artifact::LibSet { .. } => Vec::new(),
                Artifact::CMakeModule { path, .. } => vec![path.as_str()],
            };

            for (config, relative) in self.configs.iter().zip(relative_paths) {
                let full = config.prefix.join("install").join(relative);
                if !full.exists() {
                    return Err(CxxpmError::ArtifactMissingFile(full));
                }
            }
        }
        Ok(())
    }
}

/// Deduplicates a list of build types by their `mapped_to` canonical
/// name, keeping first occurrence order — the set actually driven by the
/// exporter.
pub fn dedup_by_mapped_to(build_types: &[crate::model::BuildType]) -> Vec<&crate::model::BuildType> {
    let mut seen = HashSet::new();
    build_types
        .iter()
        .filter(|bt| seen.insert(bt.mapped_to.clone()))
        .collect()
}

pub fn write_output(path: &Path, contents: &str) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_single_config_executable() {
        let tmp = tempfile::TempDir::new().unwrap();
        let prefix = tmp.path().to_path_buf();
        std::fs::create_dir_all(prefix.join("install").join("bin")).unwrap();
        std::fs::write(prefix.join("install").join("bin").join("hw"), b"").unwrap();

        let exporter = Exporter {
            package_name: "hw".to_string(),
            configs: vec![ConfigArtifacts {
                configured_name: "Release".to_string(),
                prefix,
                raw_json: r#"[{"type":"executable","name":"hw","path":"bin/hw"}]"#.to_string(),
            }],
            target_system_name: "Linux".to_string(),
        };

        let rendered = exporter.export().unwrap();
        assert!(rendered.contains("add_executable(hw IMPORTED)"));
        assert!(rendered.contains("automatically generated"));
    }

    #[test]
    fn export_fails_when_artifact_file_missing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let prefix = tmp.path().to_path_buf();
        std::fs::create_dir_all(prefix.join("install")).unwrap();

        let exporter = Exporter {
            package_name: "hw".to_string(),
            configs: vec![ConfigArtifacts {
                configured_name: "Release".to_string(),
                prefix,
                raw_json: r#"[{"type":"executable","name":"hw","path":"bin/hw"}]"#.to_string(),
            }],
            target_system_name: "Linux".to_string(),
        };

        assert!(matches!(
            exporter.export(),
            Err(CxxpmError::ArtifactMissingFile(_))
        ));
    }

    #[test]
    fn dedup_by_mapped_to_collapses_duplicates() {
        use crate::model::BuildType;
        let types = vec![
            BuildType { configured_name: "Debug".into(), mapped_to: "Debug".into() },
            BuildType { configured_name: "Profile".into(), mapped_to: "Release".into() },
            BuildType { configured_name: "Release".into(), mapped_to: "Release".into() },
        ];
        let deduped = dedup_by_mapped_to(&types);
        assert_eq!(deduped.len(), 2);
    }
}
