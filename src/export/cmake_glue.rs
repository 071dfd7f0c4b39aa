//! Consumer-glue emission: translates merged [`Artifact`]s into the CMake
//! fragment a consumer `find_package`-style includes (spec §4.8).

use crate::error::CxxpmError;
use crate::model::Artifact;

/// Renders a single-config literal or a multi-config generator
/// expression, depending on how many configurations there are.
fn config_value(configured_names: &[String], values: &[String]) -> String {
    if values.len() == 1 {
        return values[0].clone();
    }
    configured_names
        .iter()
        .zip(values)
        .map(|(cfg, v)| format!("$<$<CONFIG:{cfg}>:{v}>"))
        .collect()
}

fn upper_config_suffix(configured_names: &[String], values: &[String], property: &str) -> Vec<String> {
    if values.len() == 1 {
        return vec![format!("{property} \"{}\"", values[0])];
    }
    configured_names
        .iter()
        .zip(values)
        .map(|(cfg, v)| format!("{property}_{} \"{v}\"", cfg.to_ascii_uppercase()))
        .collect()
}

pub fn emit_header(package_name: &str, configured_names: &[String]) -> String {
    format!(
        "# This is automatically generated file by cxxpm\n# Package: {package_name}\n# Configurations: {}\n",
        configured_names.join(", ")
    )
}

/// Emits the CMake fragment for one merged artifact. `lib_whitelist` is
/// the set of library names seen in this export run, used to validate
/// `LibSet` membership.
pub fn emit_artifact(
    artifact: &Artifact,
    configured_names: &[String],
    all_artifacts: &[Artifact],
    lib_whitelist: &std::collections::HashSet<String>,
    target_system_name: &str,
) -> Result<String, CxxpmError> {
    let mut out = String::new();
    match artifact {
        Artifact::IncludeDirectory { name, paths } => {
            out.push_str(&format!(
                "set({name} {} PARENT_SCOPE)\n",
                config_value(configured_names, paths)
            ));
        }
        Artifact::StaticLibrary {
            name,
            paths,
            includes,
            definitions,
        } => {
            out.push_str(&format!("add_library({name} STATIC IMPORTED GLOBAL)\n"));
            for line in upper_config_suffix(configured_names, paths, "IMPORTED_LOCATION") {
                out.push_str(&format!("set_target_properties({name} PROPERTIES {line})\n"));
            }
            emit_includes_and_definitions(&mut out, name, includes, definitions, all_artifacts)?;
        }
        Artifact::SharedLibrary {
            name,
            paths,
            includes,
            definitions,
            dll_paths,
            implib_paths,
        } => {
            out.push_str(&format!("add_library({name} SHARED IMPORTED GLOBAL)\n"));
            let is_windows_target = target_system_name == "Windows";
            let location_paths = if is_windows_target { dll_paths } else { paths };
            for line in upper_config_suffix(configured_names, location_paths, "IMPORTED_LOCATION") {
                out.push_str(&format!("set_target_properties({name} PROPERTIES {line})\n"));
            }
            if is_windows_target {
                for line in upper_config_suffix(configured_names, implib_paths, "IMPORTED_IMPLIB") {
                    out.push_str(&format!("set_target_properties({name} PROPERTIES {line})\n"));
                }
            }
            emit_includes_and_definitions(&mut out, name, includes, definitions, all_artifacts)?;
        }
        Artifact::Executable { name, paths } => {
            out.push_str(&format!("add_executable({name} IMPORTED)\n"));
            for line in upper_config_suffix(configured_names, paths, "IMPORTED_LOCATION") {
                out.push_str(&format!("set_target_properties({name} PROPERTIES {line})\n"));
            }
        }
        Artifact::LibSet { name, libs } => {
            for lib in libs {
                if !lib_whitelist.contains(lib) {
                    return Err(CxxpmError::DanglingLibsetEntry {
                        libset_name: name.clone(),
                        lib_name: lib.clone(),
                    });
                }
            }
            out.push_str(&format!("set({name} {} PARENT_SCOPE)\n", libs.join(" ")));
        }
        Artifact::CMakeModule { path, .. } => {
            out.push_str(&format!("include({path})\n"));
        }
    }
    Ok(out)
}

fn emit_includes_and_definitions(
    out: &mut String,
    lib_name: &str,
    includes: &[String],
    definitions: &[Vec<String>],
    all_artifacts: &[Artifact],
) -> Result<(), CxxpmError> {
    if !includes.is_empty() {
        let mut resolved = Vec::new();
        for include_name in includes {
            let found = all_artifacts.iter().any(|a| {
                matches!(a, Artifact::IncludeDirectory { name, .. } if name == include_name)
            });
            if !found {
                return Err(CxxpmError::DanglingIncludeLink {
                    lib_name: lib_name.to_string(),
                    include_name: include_name.clone(),
                });
            }
            resolved.push(format!("${{{include_name}}}"));
        }
        out.push_str(&format!(
            "set_target_properties({lib_name} PROPERTIES INTERFACE_INCLUDE_DIRECTORIES \"{}\")\n",
            resolved.join(";")
        ));
    }

    if definitions.iter().any(|d| !d.is_empty()) {
        let flat: Vec<String> = definitions
            .iter()
            .flatten()
            .map(|d| format!("\"{d}\""))
            .collect();
        out.push_str(&format!(
            "set_target_properties({lib_name} PROPERTIES INTERFACE_COMPILE_DEFINITIONS \"{}\")\n",
            flat.join(";")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_config_executable_emits_plain_location() {
        let artifact = Artifact::Executable {
            name: "hw".to_string(),
            paths: vec!["bin/hw".to_string()],
        };
        let rendered = emit_artifact(&artifact, &["Release".to_string()], &[], &Default::default(), "Linux").unwrap();
        assert!(rendered.contains("add_executable(hw IMPORTED)"));
        assert!(rendered.contains("IMPORTED_LOCATION \"bin/hw\""));
    }

    #[test]
    fn multi_config_shared_library_emits_generator_and_upper_suffix() {
        let artifact = Artifact::SharedLibrary {
            name: "foo".to_string(),
            paths: vec!["lib/foo.dll".to_string(), "lib/foo.dll".to_string()],
            includes: Vec::new(),
            definitions: vec![Vec::new(), Vec::new()],
            dll_paths: vec!["bin/foo_d.dll".to_string(), "bin/foo.dll".to_string()],
            implib_paths: vec!["lib/foo_d.lib".to_string(), "lib/foo.lib".to_string()],
        };
        let configured = vec!["Debug".to_string(), "Release".to_string()];
        let rendered = emit_artifact(&artifact, &configured, &[], &Default::default(), "Windows").unwrap();
        assert!(rendered.contains("IMPORTED_LOCATION_DEBUG \"bin/foo_d.dll\""));
        assert!(rendered.contains("IMPORTED_LOCATION_RELEASE \"bin/foo.dll\""));
        assert!(rendered.contains("IMPORTED_IMPLIB_DEBUG \"lib/foo_d.lib\""));
    }

    #[test]
    fn non_windows_shared_library_uses_plain_paths_and_skips_implib() {
        let artifact = Artifact::SharedLibrary {
            name: "foo".to_string(),
            paths: vec!["lib/libfoo.so".to_string()],
            includes: Vec::new(),
            definitions: vec![Vec::new()],
            dll_paths: vec![String::new()],
            implib_paths: vec![String::new()],
        };
        let rendered = emit_artifact(&artifact, &["Release".to_string()], &[], &Default::default(), "Linux").unwrap();
        assert!(rendered.contains("IMPORTED_LOCATION \"lib/libfoo.so\""));
        assert!(!rendered.contains("IMPORTED_IMPLIB"));
    }

    #[test]
    fn dangling_include_link_is_an_error() {
        let artifact = Artifact::StaticLibrary {
            name: "foo".to_string(),
            paths: vec!["lib/foo.a".to_string()],
            includes: vec!["missing_inc".to_string()],
            definitions: vec![Vec::new()],
        };
        let result = emit_artifact(&artifact, &["Release".to_string()], &[], &Default::default(), "Linux");
        assert!(matches!(result, Err(CxxpmError::DanglingIncludeLink { .. })));
    }

    #[test]
    fn libset_must_be_in_whitelist() {
        let artifact = Artifact::LibSet {
            name: "all".to_string(),
            libs: vec!["unknown".to_string()],
        };
        let result = emit_artifact(&artifact, &["Release".to_string()], &[], &Default::default(), "Linux");
        assert!(matches!(result, Err(CxxpmError::DanglingLibsetEntry { .. })));
    }
}
