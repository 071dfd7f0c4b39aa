//! Artifact model: the per-configuration JSON the `artifacts` shell
//! function prints, and the merged multi-configuration form the exporter
//! emits consumer glue from.

use serde::Deserialize;

use crate::error::CxxpmError;

/// One element of the JSON array a single configuration's `artifacts`
/// function prints to stdout.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawArtifact {
    Include {
        name: String,
        path: String,
    },
    StaticLib {
        name: String,
        path: String,
        #[serde(default)]
        includes: Vec<String>,
        #[serde(default)]
        definitions: Vec<String>,
    },
    SharedLib {
        name: String,
        path: String,
        #[serde(default)]
        includes: Vec<String>,
        #[serde(default)]
        definitions: Vec<String>,
        dll: Option<String>,
        implib: Option<String>,
    },
    Executable {
        name: String,
        path: String,
    },
    Libset {
        name: String,
        libs: Vec<String>,
    },
    CmakeModule {
        name: String,
        path: String,
    },
}

impl RawArtifact {
    pub fn name(&self) -> &str {
        match self {
            RawArtifact::Include { name, .. }
            | RawArtifact::StaticLib { name, .. }
            | RawArtifact::SharedLib { name, .. }
            | RawArtifact::Executable { name, .. }
            | RawArtifact::Libset { name, .. }
            | RawArtifact::CmakeModule { name, .. } => name,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            RawArtifact::Include { .. } => "include",
            RawArtifact::StaticLib { .. } => "static_lib",
            RawArtifact::SharedLib { .. } => "shared_lib",
            RawArtifact::Executable { .. } => "executable",
            RawArtifact::Libset { .. } => "libset",
            RawArtifact::CmakeModule { .. } => "cmake_module",
        }
    }
}

/// A multi-configuration artifact: each per-config vector has the same
/// length (the number of configurations) and the same order.
#[derive(Debug, Clone)]
pub enum Artifact {
    IncludeDirectory {
        name: String,
        paths: Vec<String>,
    },
    StaticLibrary {
        name: String,
        paths: Vec<String>,
        includes: Vec<String>,
        definitions: Vec<Vec<String>>,
    },
    SharedLibrary {
        name: String,
        paths: Vec<String>,
        includes: Vec<String>,
        definitions: Vec<Vec<String>>,
        dll_paths: Vec<String>,
        implib_paths: Vec<String>,
    },
    Executable {
        name: String,
        paths: Vec<String>,
    },
    LibSet {
        name: String,
        libs: Vec<String>,
    },
    CMakeModule {
        name: String,
        path: String,
    },
}

impl Artifact {
    pub fn name(&self) -> &str {
        match self {
            Artifact::IncludeDirectory { name, .. }
            | Artifact::StaticLibrary { name, .. }
            | Artifact::SharedLibrary { name, .. }
            | Artifact::Executable { name, .. }
            | Artifact::LibSet { name, .. }
            | Artifact::CMakeModule { name, .. } => name,
        }
    }

    fn from_first(raw: RawArtifact) -> Result<Artifact, CxxpmError> {
        Ok(match raw {
            RawArtifact::Include { name, path } => Artifact::IncludeDirectory {
                name,
                paths: vec![path],
            },
            RawArtifact::StaticLib {
                name,
                path,
                includes,
                definitions,
            } => Artifact::StaticLibrary {
                name,
                paths: vec![path],
                includes,
                definitions: vec![definitions],
            },
            RawArtifact::SharedLib {
                name,
                path,
                includes,
                definitions,
                dll,
                implib,
            } => {
                let (dll, implib) = require_dll_implib(&name, dll, implib)?;
                Artifact::SharedLibrary {
                    name,
                    paths: vec![path],
                    includes,
                    definitions: vec![definitions],
                    dll_paths: vec![dll],
                    implib_paths: vec![implib],
                }
            }
            RawArtifact::Executable { name, path } => Artifact::Executable {
                name,
                paths: vec![path],
            },
            RawArtifact::Libset { name, libs } => Artifact::LibSet { name, libs },
            RawArtifact::CmakeModule { name, path } => Artifact::CMakeModule { name, path },
        })
    }

    fn merge_one(&mut self, raw: RawArtifact) -> Result<(), CxxpmError> {
        let reason_mismatch = |expected: &str| {
            CxxpmError::ArtifactMerge {
                name: raw.name().to_string(),
                reason: format!("expected a {expected} artifact, got {}", raw.tag()),
            }
        };

        match (self, raw) {
            (Artifact::IncludeDirectory { paths, .. }, RawArtifact::Include { path, .. }) => {
                paths.push(path);
                Ok(())
            }
            (
                Artifact::StaticLibrary {
                    paths,
                    includes,
                    definitions,
                    ..
                },
                RawArtifact::StaticLib {
                    path,
                    includes: inc,
                    definitions: defs,
                    ..
                },
            ) => {
                paths.push(path);
                definitions.push(defs);
                if *includes != inc {
                    return Err(CxxpmError::ArtifactMerge {
                        name: paths.first().cloned().unwrap_or_default(),
                        reason: "include-links differ across configurations".to_string(),
                    });
                }
                Ok(())
            }
            (
                Artifact::SharedLibrary {
                    name,
                    paths,
                    includes,
                    definitions,
                    dll_paths,
                    implib_paths,
                },
                RawArtifact::SharedLib {
                    path,
                    includes: inc,
                    definitions: defs,
                    dll,
                    implib,
                    ..
                },
            ) => {
                let (dll, implib) = require_dll_implib(name, dll, implib)?;
                paths.push(path);
                definitions.push(defs);
                dll_paths.push(dll);
                implib_paths.push(implib);
                if *includes != inc {
                    return Err(CxxpmError::ArtifactMerge {
                        name: name.clone(),
                        reason: "include-links differ across configurations".to_string(),
                    });
                }
                Ok(())
            }
            (Artifact::Executable { paths, .. }, RawArtifact::Executable { path, .. }) => {
                paths.push(path);
                Ok(())
            }
            (Artifact::LibSet { name, libs }, RawArtifact::Libset { libs: other, .. }) => {
                if *libs != other {
                    return Err(CxxpmError::ArtifactMerge {
                        name: name.clone(),
                        reason: "libset members differ across configurations".to_string(),
                    });
                }
                Ok(())
            }
            (Artifact::CMakeModule { .. }, RawArtifact::CmakeModule { .. }) => {
                // Only the first configuration's path is kept, per spec.
                Ok(())
            }
            (this, raw) => Err(reason_mismatch(this.tag())),
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            Artifact::IncludeDirectory { .. } => "include",
            Artifact::StaticLibrary { .. } => "static_lib",
            Artifact::SharedLibrary { .. } => "shared_lib",
            Artifact::Executable { .. } => "executable",
            Artifact::LibSet { .. } => "libset",
            Artifact::CMakeModule { .. } => "cmake_module",
        }
    }
}

fn require_dll_implib(
    name: &str,
    dll: Option<String>,
    implib: Option<String>,
) -> Result<(String, String), CxxpmError> {
    match (dll, implib) {
        (Some(d), Some(i)) => Ok((d, i)),
        _ => Err(CxxpmError::ArtifactMerge {
            name: name.to_string(),
            reason: "shared_lib is missing dll or implib".to_string(),
        }),
    }
}

/// Folds one `RawArtifact` list per configuration into a single merged
/// list with per-config vectors of length `per_config.len()`.
pub fn merge_configurations(
    per_config: Vec<Vec<RawArtifact>>,
) -> Result<Vec<Artifact>, CxxpmError> {
    let mut iter = per_config.into_iter();
    let Some(first) = iter.next() else {
        return Ok(Vec::new());
    };

    let mut merged: Vec<Artifact> = first
        .into_iter()
        .map(Artifact::from_first)
        .collect::<Result<_, _>>()?;

    for (config_index, config_artifacts) in iter.enumerate() {
        if config_artifacts.len() != merged.len() {
            return Err(CxxpmError::ArtifactCountMismatch {
                prev: "configuration 0".to_string(),
                curr: format!("configuration {}", config_index + 1),
            });
        }
        for (slot, raw) in merged.iter_mut().zip(config_artifacts) {
            if slot.name() != raw.name() {
                return Err(CxxpmError::ArtifactMerge {
                    name: raw.name().to_string(),
                    reason: format!(
                        "artifact order mismatch: expected `{}` at this position",
                        slot.name()
                    ),
                });
            }
            slot.merge_one(raw)?;
        }
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exe(name: &str, path: &str) -> RawArtifact {
        RawArtifact::Executable {
            name: name.to_string(),
            path: path.to_string(),
        }
    }

    #[test]
    fn merge_single_config_executable() {
        let merged = merge_configurations(vec![vec![exe("hw", "bin/hw")]]).unwrap();
        assert_eq!(merged.len(), 1);
        match &merged[0] {
            Artifact::Executable { name, paths } => {
                assert_eq!(name, "hw");
                assert_eq!(paths, &vec!["bin/hw".to_string()]);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn merge_two_configs_preserves_order_and_length() {
        let merged = merge_configurations(vec![
            vec![exe("hw", "Debug/bin/hw")],
            vec![exe("hw", "Release/bin/hw")],
        ])
        .unwrap();
        match &merged[0] {
            Artifact::Executable { paths, .. } => {
                assert_eq!(
                    paths,
                    &vec!["Debug/bin/hw".to_string(), "Release/bin/hw".to_string()]
                );
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn merge_fails_on_count_mismatch() {
        let result = merge_configurations(vec![
            vec![exe("hw", "Debug/bin/hw")],
            vec![exe("hw", "Release/bin/hw"), exe("other", "Release/bin/other")],
        ]);
        assert!(matches!(
            result,
            Err(CxxpmError::ArtifactCountMismatch { .. })
        ));
    }

    #[test]
    fn shared_lib_without_dll_fails() {
        let raw = RawArtifact::SharedLib {
            name: "foo".to_string(),
            path: "lib/foo.so".to_string(),
            includes: Vec::new(),
            definitions: Vec::new(),
            dll: None,
            implib: None,
        };
        let result = merge_configurations(vec![vec![raw]]);
        assert!(result.is_err());
    }

    #[test]
    fn libset_members_must_match_across_configs() {
        let a = RawArtifact::Libset {
            name: "all".to_string(),
            libs: vec!["foo".to_string()],
        };
        let b = RawArtifact::Libset {
            name: "all".to_string(),
            libs: vec!["bar".to_string()],
        };
        let result = merge_configurations(vec![vec![a], vec![b]]);
        assert!(result.is_err());
    }
}
