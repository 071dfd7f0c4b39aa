//! InstallEngine: idempotent install with manifest verification,
//! dependency walk, fetch, build, and manifest emission (spec §4.7).

pub mod fetch;
pub mod manifest;
pub mod package_root;
pub mod shellvars;

use std::path::{Path, PathBuf};

use crate::error::CxxpmError;
use crate::model::{BuildType, Language, Package, SystemInfo};
use crate::util::context::GlobalContext;
use crate::util::process::ProcessRunner;

use fetch::FetchSpec;
use package_root::PackageRoot;

/// Everything the recursive install walk needs that doesn't change
/// per-dependency: the global context, a process runner, and the package
/// search path.
pub struct InstallEngine<'a> {
    pub gctx: &'a GlobalContext,
    pub runner: &'a ProcessRunner<'a>,
    pub pkg_root: &'a PackageRoot,
}

impl<'a> InstallEngine<'a> {
    /// `install(package, build_type)`. When `external_prefix` is set, this
    /// call is a dependency fold: the payload lands in the caller's
    /// prefix, no manifest is prepared/emitted, and the install directory
    /// is not re-created from scratch.
    ///
    /// `compilers`/`linker`/`resource_compiler` are the toolchain the
    /// caller already discovered for this run; they're unused for binary
    /// packages (which have no `build()` step) and are forwarded unchanged
    /// down the dependency recursion, since dependencies share their
    /// parent's toolchain.
    #[allow(clippy::too_many_arguments)]
    pub fn install(
        &self,
        pkg: &mut Package,
        system: &SystemInfo,
        build_type: &BuildType,
        toolchain_id: &str,
        external_prefix: Option<&Path>,
        compilers: &[(Language, crate::model::CompilerInfo)],
        linker: Option<&Path>,
        resource_compiler: Option<&Path>,
    ) -> Result<(), CxxpmError> {
        let prefix = match external_prefix {
            Some(p) => p.to_path_buf(),
            None => self.derive_prefix(pkg, build_type, toolchain_id),
        };
        pkg.set_prefix(prefix.clone());
        let install_dir = prefix.join("install");

        // Step 1: fast-path verification (only for the outermost install).
        if external_prefix.is_none() {
            let manifest_path = prefix.join("manifest.txt");
            if let Ok(contents) = std::fs::read_to_string(&manifest_path) {
                if manifest::verify(&install_dir, &contents) {
                    return Ok(());
                }
            }
        }

        // Step 2: destructive cleanup.
        if external_prefix.is_none() && prefix.exists() {
            self.remove_prefix(&prefix)?;
        }
        std::fs::create_dir_all(&install_dir)?;

        // Step 3: scratch directories.
        let (source_dir, build_dir) = if !pkg.is_binary {
            let s = self.gctx.scratch_source_dir();
            let b = self.gctx.scratch_build_dir();
            recreate_dir(&s)?;
            recreate_dir(&b)?;
            (s, b)
        } else {
            (PathBuf::new(), PathBuf::new())
        };

        // Step 4: dependency recursion (depth-first; each dependency
        // fully installs into our own install tree before we proceed).
        for dep_name in self.pkg_root.dependencies(pkg, self.runner)? {
            let mut dep = self.pkg_root.load(&dep_name, None, self.runner)?;
            self.install(
                &mut dep,
                system,
                build_type,
                toolchain_id,
                Some(&install_dir),
                compilers,
                linker,
                resource_compiler,
            )?;
        }

        // Step 5: fetch. Binary packages fetch straight into the install
        // directory (there's no separate scratch source dir for them) and
        // read host/processor-prefixed variable names instead of bare ones.
        let fetch_dest = if pkg.is_binary { &install_dir } else { &source_dir };
        let var_prefix = pkg
            .is_binary
            .then(|| format!("{}_{}_", system.target_name, system.target_processor));
        self.fetch_source(pkg, fetch_dest, var_prefix.as_deref())?;

        // Step 6: build. Binary packages ship their payload pre-built; only
        // the `build` shell function is skipped.
        if !pkg.is_binary {
            self.build(
                pkg,
                system,
                build_type,
                &source_dir,
                &build_dir,
                &install_dir,
                &prefix,
                compilers,
                linker,
                resource_compiler,
            )?;
        }

        // Step 7: manifest (outermost only).
        if external_prefix.is_none() {
            let contents = manifest::build_manifest(&install_dir)?;
            std::fs::write(prefix.join("manifest.txt"), contents)?;
        }

        // Step 8: cleanup scratch.
        if !pkg.is_binary {
            let _ = std::fs::remove_dir_all(&source_dir);
            let _ = std::fs::remove_dir_all(&build_dir);
        }

        Ok(())
    }

    fn derive_prefix(&self, pkg: &Package, build_type: &BuildType, toolchain_id: &str) -> PathBuf {
        if pkg.is_binary {
            self.gctx.binary_package_dir(&pkg.name, &pkg.version)
        } else {
            let package_id = crate::prefix::package_id(&pkg.version, &build_type.mapped_to);
            self.gctx
                .install_prefix(toolchain_id, &pkg.name, &pkg.version, &build_type.mapped_to, &package_id)
        }
    }

    fn remove_prefix(&self, prefix: &Path) -> Result<(), CxxpmError> {
        if std::fs::remove_dir_all(prefix).is_err() && cfg!(windows) {
            // Native recursive-remove has known edge cases on Windows
            // (locked DLLs, long paths); fall back to the bundled shell.
            let _ = self.runner.run_no_capture(
                Path::new("."),
                Path::new("bash"),
                &["-c".to_string(), format!("rm -rf '{}'", prefix.display())],
                &[],
                true,
            );
        }
        Ok(())
    }

    fn fetch_source(
        &self,
        pkg: &Package,
        dest_dir: &Path,
        var_prefix: Option<&str>,
    ) -> Result<(), CxxpmError> {
        let spec = self.read_fetch_spec(pkg, var_prefix)?;
        match spec {
            FetchSpec::Archive { url, sha3 } => {
                fetch::fetch_archive(&url, &sha3, &self.gctx.distr_dir(), dest_dir, self.runner)
            }
            FetchSpec::Git { url, tag, commit } => {
                fetch::fetch_git(&url, tag.as_deref(), commit.as_deref(), dest_dir, self.runner)
            }
        }
    }

    /// Reads the `TYPE`/`URL`/`SHA3`/`TAG`/`COMMIT` fetch variables, or their
    /// `<var_prefix>`-prefixed forms for binary packages (e.g.
    /// `Linux_x86_64_TYPE`).
    fn read_fetch_spec(&self, pkg: &Package, var_prefix: Option<&str>) -> Result<FetchSpec, CxxpmError> {
        let read = |var: &str| {
            let name = match var_prefix {
                Some(prefix) => format!("{prefix}{var}"),
                None => var.to_string(),
            };
            shellvars::read_var(&pkg.build_file, &name, self.runner).unwrap_or_default()
        };
        let fetch_type = read("TYPE");
        match fetch_type.trim() {
            "archive" => Ok(FetchSpec::Archive {
                url: read("URL"),
                sha3: read("SHA3"),
            }),
            "git" => {
                let tag = read("TAG");
                let commit = read("COMMIT");
                Ok(FetchSpec::Git {
                    url: read("URL"),
                    tag: (!tag.is_empty()).then_some(tag),
                    commit: (!commit.is_empty()).then_some(commit),
                })
            }
            other => Err(CxxpmError::MissingVariable {
                name: pkg.name.clone(),
                var: if other.is_empty() { "TYPE" } else { "TYPE(unknown)" },
            }),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        pkg: &Package,
        system: &SystemInfo,
        build_type: &BuildType,
        source_dir: &Path,
        build_dir: &Path,
        install_dir: &Path,
        prefix: &Path,
        compilers: &[(Language, crate::model::CompilerInfo)],
        linker: Option<&Path>,
        resource_compiler: Option<&Path>,
    ) -> Result<(), CxxpmError> {
        let log_path = prefix.join("build.log");
        let mut log = std::fs::File::create(&log_path)?;

        let env = self.compose_env(
            pkg,
            system,
            build_type,
            source_dir,
            build_dir,
            install_dir,
            compilers,
            linker,
            resource_compiler,
        );
        let script = format!(
            "set -x; set -e; source \"{}\"; build;",
            pkg.build_file.display()
        );
        let ok = self
            .runner
            .run_capture_log(
                build_dir,
                Path::new("bash"),
                &["-c".to_string(), script],
                &env,
                &mut log,
                true,
            )
            .map_err(|_| CxxpmError::BuildFailed { log: log_path.clone() })?;

        if !ok {
            return Err(CxxpmError::BuildFailed { log: log_path });
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn compose_env(
        &self,
        pkg: &Package,
        system: &SystemInfo,
        build_type: &BuildType,
        source_dir: &Path,
        build_dir: &Path,
        install_dir: &Path,
        compilers: &[(Language, crate::model::CompilerInfo)],
        linker: Option<&Path>,
        resource_compiler: Option<&Path>,
    ) -> Vec<String> {
        // Compiler/linker/resource-compiler discovery happens once in the
        // caller (spec §4.1-§4.4), before the dependency walk starts;
        // every build step in this install shares the same toolchain.
        let composer = crate::env_compose::BuildEnvironmentComposer {
            system,
            compilers,
            linker,
            resource_compiler,
            self_exe: &std::env::current_exe().unwrap_or_default(),
            source_dir,
            build_dir,
            install_dir,
            package_dir: &pkg.path,
            version: &pkg.version,
            build_type: &build_type.mapped_to,
            global_args: &[],
        };
        let configure_args = crate::env_compose::cmake_configure_args(compilers, system, &build_type.mapped_to);
        let build_args = crate::env_compose::cmake_build_args(system, &build_type.mapped_to);
        composer.compose(&configure_args, &build_args)
    }
}

fn recreate_dir(dir: &Path) -> Result<(), CxxpmError> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)?;
    }
    std::fs::create_dir_all(dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Package;

    #[test]
    fn derive_prefix_binary_package_uses_binary_packages_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let gctx = GlobalContext::new(Some(tmp.path().to_path_buf())).unwrap();
        let cache = crate::util::PathCache::new();
        let runner = ProcessRunner::new(&cache);
        let pkg_root = PackageRoot::new(tmp.path().to_path_buf());
        let engine = InstallEngine {
            gctx: &gctx,
            runner: &runner,
            pkg_root: &pkg_root,
        };

        let mut pkg = Package::stub("zlib", tmp.path().to_path_buf());
        pkg.version = "1.3".to_string();
        pkg.is_binary = true;

        let build_type = BuildType {
            configured_name: "Release".into(),
            mapped_to: "Release".into(),
        };
        let prefix = engine.derive_prefix(&pkg, &build_type, "abc");
        assert_eq!(prefix, gctx.binary_package_dir("zlib", "1.3"));
    }
}
