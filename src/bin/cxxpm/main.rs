mod cli;

use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use cxxpm::export::{dedup_by_mapped_to, ConfigArtifacts, Exporter};
use cxxpm::install::package_root::PackageRoot;
use cxxpm::install::shellvars;
use cxxpm::install::InstallEngine;
use cxxpm::model::{parse_build_type_mapping, Language, Package, SystemInfo};
use cxxpm::prefix::{package_id, toolchain_id};
use cxxpm::system::{system_name, system_processor};
use cxxpm::toolchain::{find_compiler, find_linker, find_resource_compiler, reconcile};
use cxxpm::util::context::GlobalContext;
use cxxpm::util::pathconv::PathStyle;
use cxxpm::util::process::{install_fatal_signal_handler, ProcessRunner};

use cli::{Cli, HiddenCommand};

fn main() {
    install_fatal_signal_handler();

    let cli = Cli::parse();

    if let Some(HiddenCommand::Completions { shell }) = cli.hidden_command {
        clap_complete::generate(shell, &mut Cli::command(), "cxxpm", &mut std::io::stdout());
        return;
    }

    match run(cli) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut gctx = GlobalContext::new(cli.home.clone())?;

    // Config is loaded before logging/verbosity is decided, so
    // `config.verbose` can take part in the CLI > config file > built-in
    // default precedence described in its doc comment.
    let config = cxxpm::util::config::Config::load_or_default(&gctx.config_path());
    let verbose = cli.verbose || config.verbose;
    init_logging(verbose);
    gctx.set_verbose(verbose);

    let package_root_dir = cli
        .package_root
        .clone()
        .or_else(|| config.package_root.clone().map(PathBuf::from))
        .unwrap_or_else(|| gctx.default_package_root());

    let mut pkg_root = PackageRoot::new(package_root_dir);
    pkg_root.extra_dirs = cli.package_extra_dir.clone();
    pkg_root.fix_extra_search_dirs = cli.fix_extra_search_dirs;

    if cli.mode.package_list {
        return cmd_package_list(&pkg_root);
    }

    if let Some(name) = &cli.mode.search_path {
        return cmd_search_path(&cli, &config, &gctx, &pkg_root, name);
    }

    if let Some(name) = &cli.mode.install {
        return cmd_install(&cli, &config, &gctx, &pkg_root, name);
    }

    anyhow::bail!("no mode given: pass one of --package-list, --search-path, --install")
}

fn cmd_package_list(pkg_root: &PackageRoot) -> anyhow::Result<()> {
    let packages_dir = pkg_root.root.join("packages");
    if !packages_dir.is_dir() {
        return Ok(());
    }
    for entry in std::fs::read_dir(&packages_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            println!("{}", entry.file_name().to_string_lossy());
        }
    }
    Ok(())
}

fn build_system_info(cli: &Cli, config: &cxxpm::util::config::Config) -> anyhow::Result<SystemInfo> {
    let host_name = system_name();
    let host_processor = system_processor();
    let target_name = cli.system_name.clone().unwrap_or_else(|| host_name.clone());
    let target_processor = cli
        .system_processor
        .clone()
        .unwrap_or_else(|| host_processor.clone());

    let config_mapping_rules = (!config.build_type_mapping.is_empty()).then(|| {
        config
            .build_type_mapping
            .iter()
            .map(|(from, to)| format!("{from}:{to}"))
            .collect::<Vec<_>>()
            .join(";")
    });
    let mapping_rules = cli
        .build_type_mapping
        .clone()
        .or(config_mapping_rules)
        .unwrap_or_else(|| "*:Release".to_string());
    let build_types = parse_build_type_mapping(&mapping_rules, &cli.build_type)?;

    Ok(SystemInfo {
        host_name,
        host_processor,
        target_name,
        target_processor,
        target_sub_type: None,
        build_types,
        msvc_install_dir: cli.vs_install_dir.clone(),
        msvc_toolset_name: None,
        msvc_toolset_version: cli.vc_toolset.clone(),
    })
}

fn discover_compilers(
    cli: &Cli,
    system: &SystemInfo,
    runner: &ProcessRunner,
) -> anyhow::Result<Vec<(Language, cxxpm::model::CompilerInfo)>> {
    let requested: std::collections::HashMap<&str, &str> = cli
        .compiler
        .iter()
        .filter_map(|entry| entry.split_once(':'))
        .collect();

    let mut found = Vec::new();
    for language in [Language::C, Language::Cxx] {
        let key = match language {
            Language::C => "C",
            Language::Cxx => "C++",
        };
        let requested_path = requested.get(key).map(PathBuf::from);
        let info = find_compiler(language, requested_path.as_deref(), system, runner)?;
        found.push((language, info));
    }
    reconcile(system, &found)?;
    Ok(found)
}

/// Mirrors `InstallEngine::derive_prefix` — the deterministic prefix a
/// package resolves to given its toolchain and build type, recomputed here
/// since `--search-path` runs standalone rather than right after install.
fn derive_prefix(gctx: &GlobalContext, pkg: &Package, tid: &str, build_type_mapped: &str) -> PathBuf {
    if pkg.is_binary {
        gctx.binary_package_dir(&pkg.name, &pkg.version)
    } else {
        let pid = package_id(&pkg.version, build_type_mapped);
        gctx.install_prefix(tid, &pkg.name, &pkg.version, build_type_mapped, &pid)
    }
}

fn cmd_install(
    cli: &Cli,
    config: &cxxpm::util::config::Config,
    gctx: &GlobalContext,
    pkg_root: &PackageRoot,
    name: &str,
) -> anyhow::Result<()> {
    let runner = ProcessRunner::new(gctx.path_cache());
    let mut system = build_system_info(cli, config)?;

    let mut pkg = pkg_root.load(name, None, &runner)?;

    // Binary packages land in a toolchain-independent prefix (spec §4.5);
    // no point probing for a compiler that build won't use.
    let (compilers, linker, resource_compiler, tid) = if pkg.is_binary {
        (Vec::new(), None, None, String::new())
    } else {
        let compilers = discover_compilers(cli, &system, &runner)?;
        system.target_sub_type = compilers
            .first()
            .and_then(|(_, info)| info.system_sub_type.clone());
        let compiler_ids: Vec<String> = compilers.iter().map(|(_, info)| info.id.clone()).collect();
        let tid = toolchain_id(&system.target_name, &system.target_processor, &compiler_ids);
        let linker = compilers
            .first()
            .and_then(|(_, info)| find_linker(info, &system.host_name, &runner));
        let resource_compiler = compilers
            .first()
            .and_then(|(_, info)| find_resource_compiler(info, &system.host_name, &runner));
        (compilers, linker, resource_compiler, tid)
    };

    let engine = InstallEngine {
        gctx,
        runner: &runner,
        pkg_root,
    };

    if let Some(output) = &cli.mode.export_cmake {
        let configs = dedup_by_mapped_to(&system.build_types)
            .into_iter()
            .map(|bt| -> anyhow::Result<ConfigArtifacts> {
                engine.install(
                    &mut pkg,
                    &system,
                    bt,
                    &tid,
                    None,
                    &compilers,
                    linker.as_deref(),
                    resource_compiler.as_deref(),
                )?;
                let prefix = pkg.prefix().to_path_buf();
                let env = Vec::new();
                let (ok, json) = shellvars::call_function_captured(
                    &pkg.build_file,
                    "artifacts",
                    &prefix,
                    &env,
                    &runner,
                )?;
                if !ok {
                    anyhow::bail!("artifacts() failed for configuration {}", bt.configured_name);
                }
                Ok(ConfigArtifacts {
                    configured_name: bt.configured_name.clone(),
                    prefix,
                    raw_json: json,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let exporter = Exporter {
            package_name: name.to_string(),
            configs,
            target_system_name: system.target_name.clone(),
        };
        let rendered = exporter.export().map_err(anyhow::Error::from)?;
        cxxpm::export::write_output(output, &rendered)?;
    } else {
        let build_type = system
            .build_types
            .first()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no build type configured"))?;
        engine.install(
            &mut pkg,
            &system,
            &build_type,
            &tid,
            None,
            &compilers,
            linker.as_deref(),
            resource_compiler.as_deref(),
        )?;
    }

    Ok(())
}

fn cmd_search_path(
    cli: &Cli,
    config: &cxxpm::util::config::Config,
    gctx: &GlobalContext,
    pkg_root: &PackageRoot,
    name: &str,
) -> anyhow::Result<()> {
    let runner = ProcessRunner::new(gctx.path_cache());
    let mut system = build_system_info(cli, config)?;

    let pkg = pkg_root.load(name, None, &runner)?;
    let tid = if pkg.is_binary {
        String::new()
    } else {
        let compilers = discover_compilers(cli, &system, &runner)?;
        system.target_sub_type = compilers
            .first()
            .and_then(|(_, info)| info.system_sub_type.clone());
        let compiler_ids: Vec<String> = compilers.iter().map(|(_, info)| info.id.clone()).collect();
        toolchain_id(&system.target_name, &system.target_processor, &compiler_ids)
    };
    let build_type = system
        .build_types
        .first()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("no build type configured"))?;

    let prefix = derive_prefix(gctx, &pkg, &tid, &build_type.mapped_to);
    let manifest = std::fs::read_to_string(prefix.join("manifest.txt"))
        .map_err(|e| anyhow::anyhow!("package `{name}` is not installed: {e}"))?;

    let suffix = cli.mode.file.clone().unwrap_or_default();
    let style = PathStyle::from_str_opt(&cli.mode.search_path_type).unwrap_or(PathStyle::Native);
    let resolved = cxxpm::search_path::resolve(&prefix, &manifest, &suffix, style)
        .map_err(anyhow::Error::from)?;
    println!("{resolved}");
    Ok(())
}
