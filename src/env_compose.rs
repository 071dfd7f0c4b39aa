//! BuildEnvironmentComposer: the closed set of `CXXPM_*=value` strings
//! passed to every package build script (spec §4.6).

use std::path::Path;

use crate::model::{CompilerInfo, Language, SystemInfo};
use crate::toolchain::msvc::cmake_generator_platform;
use crate::util::pathconv::{convert, PathStyle};

/// Platform library prefix/suffixes (spec §4.6 closed table).
pub struct LibraryNaming {
    pub prefix: &'static str,
    pub static_suffix: &'static str,
    pub shared_suffix: &'static str,
    pub exe_suffix: &'static str,
}

pub fn library_naming(system_name: &str, sub_type: Option<&str>) -> LibraryNaming {
    match (system_name, sub_type) {
        ("Windows", Some("msvc")) | ("Windows", None) => LibraryNaming {
            prefix: "",
            static_suffix: ".lib",
            shared_suffix: ".dll",
            exe_suffix: ".exe",
        },
        ("Windows", Some("cygwin")) => LibraryNaming {
            prefix: "lib",
            static_suffix: ".a",
            shared_suffix: ".so",
            exe_suffix: ".exe",
        },
        ("Windows", Some(sub)) if sub.starts_with("mingw") => LibraryNaming {
            prefix: "lib",
            static_suffix: ".a",
            shared_suffix: ".dll",
            exe_suffix: ".exe",
        },
        ("Darwin", _) => LibraryNaming {
            prefix: "lib",
            static_suffix: ".a",
            shared_suffix: ".dylib",
            exe_suffix: "",
        },
        _ => LibraryNaming {
            prefix: "lib",
            static_suffix: ".a",
            shared_suffix: ".so",
            exe_suffix: "",
        },
    }
}

pub struct BuildEnvironmentComposer<'a> {
    pub system: &'a SystemInfo,
    pub compilers: &'a [(Language, CompilerInfo)],
    pub linker: Option<&'a Path>,
    pub resource_compiler: Option<&'a Path>,
    pub self_exe: &'a Path,
    pub source_dir: &'a Path,
    pub build_dir: &'a Path,
    pub install_dir: &'a Path,
    pub package_dir: &'a Path,
    pub version: &'a str,
    pub build_type: &'a str,
    pub global_args: &'a [String],
}

impl<'a> BuildEnvironmentComposer<'a> {
    /// Produces the ordered `NAME=VALUE` list handed to `ProcessRunner`'s
    /// `extra_env`.
    pub fn compose(&self, cmake_configure_args: &str, cmake_build_args: &str) -> Vec<String> {
        let mut env = Vec::new();
        let push = |env: &mut Vec<String>, k: &str, v: String| env.push(format!("{k}={v}"));

        push(&mut env, "CXXPM_GLOBAL_ARGS", self.global_args.join(" "));
        push(
            &mut env,
            "CXXPM_PARALLELISM",
            (std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1) + 1).to_string(),
        );
        push(&mut env, "CXXPM_SELF", convert(self.self_exe, PathStyle::Posix));
        push(&mut env, "CXXPM_TARGET_SYSTEM_NAME", self.system.target_name.clone());
        push(&mut env, "CXXPM_TARGET_SYSTEM_PROCESSOR", self.system.target_processor.clone());
        push(
            &mut env,
            "CXXPM_TARGET_SUB_TYPE",
            self.system.target_sub_type.clone().unwrap_or_default(),
        );
        push(&mut env, "CXXPM_BUILD_TYPE", self.build_type.to_string());
        if let Some(toolset) = &self.system.msvc_toolset_version {
            push(&mut env, "CXXPM_MSVC_TOOLSET_VERSION", toolset.clone());
        }

        for (language, info) in self.compilers {
            let lang = match language {
                Language::C => "C",
                Language::Cxx => "CXX",
            };
            push(
                &mut env,
                &format!("CXXPM_COMPILER_{lang}_COMMAND"),
                convert(&info.command, PathStyle::Posix),
            );
            push(
                &mut env,
                &format!("CXXPM_COMPILER_{lang}_TYPE"),
                format!("{:?}", info.compiler_type),
            );
        }

        if let Some(linker) = self.linker {
            push(&mut env, "CXXPM_TOOL_LINKER_COMMAND", convert(linker, PathStyle::Posix));
        }
        if let Some(rc) = self.resource_compiler {
            push(&mut env, "CXXPM_TOOL_RC_COMMAND", convert(rc, PathStyle::Posix));
        }

        push(&mut env, "CXXPM_CMAKE_CONFIGURE_ARGS", cmake_configure_args.to_string());
        push(&mut env, "CXXPM_CMAKE_BUILD_ARGS", cmake_build_args.to_string());

        push(
            &mut env,
            "CXXPM_AUTOTOOLS_PROCESSOR",
            crate::toolchain::denormalize_to_gnu_processor(&self.system.target_processor)
                .unwrap_or(&self.system.target_processor)
                .to_string(),
        );
        push(
            &mut env,
            "CXXPM_AUTOTOOLS_SYSTEM_NAME",
            autotools_system_suffix(&self.system.target_name, self.system.target_sub_type.as_deref()),
        );
        push(
            &mut env,
            "CXXPM_AUTOTOOLS_HOST",
            format!(
                "{}-{}",
                crate::toolchain::denormalize_to_gnu_processor(&self.system.target_processor)
                    .unwrap_or(&self.system.target_processor),
                autotools_system_suffix(&self.system.target_name, self.system.target_sub_type.as_deref())
            ),
        );

        if self.system.target_name == "Darwin" {
            if let Some(clang_arch) = darwin_clang_arch(&self.system.target_processor) {
                push(&mut env, "CXXPM_CLANG_ARCH", clang_arch.to_string());
            }
        }

        if self.system.target_name == "Windows" {
            if let Some(platform) = cmake_generator_platform(&self.system.target_processor) {
                push(&mut env, "CXXPM_MSVC_ARCH", platform.to_string());
            }
        }

        push(&mut env, "SOURCE_DIR", convert(self.source_dir, PathStyle::Posix));
        push(&mut env, "BUILD_DIR", convert(self.build_dir, PathStyle::Posix));
        push(&mut env, "INSTALL_DIR", convert(self.install_dir, PathStyle::Posix));
        push(&mut env, "PACKAGE_DIR", convert(self.package_dir, PathStyle::Posix));
        push(&mut env, "CXXPM_PACKAGE_VERSION", self.version.to_string());

        let naming = library_naming(&self.system.target_name, self.system.target_sub_type.as_deref());
        push(&mut env, "CXXPM_LIBRARY_PREFIX", naming.prefix.to_string());
        push(&mut env, "CXXPM_STATIC_LIBRARY_SUFFIX", naming.static_suffix.to_string());
        push(&mut env, "CXXPM_SHARED_LIBRARY_SUFFIX", naming.shared_suffix.to_string());
        push(&mut env, "CXXPM_EXECUTABLE_SUFFIX", naming.exe_suffix.to_string());

        env
    }
}

fn autotools_system_suffix(system_name: &str, sub_type: Option<&str>) -> String {
    match (system_name, sub_type) {
        ("Darwin", _) => "apple-darwin".to_string(),
        ("Linux", _) => "linux-gnu".to_string(),
        ("Windows", Some("cygwin")) => "pc-cygwin".to_string(),
        ("Windows", _) => "w64-mingw32".to_string(),
        (other, _) => other.to_string(),
    }
}

fn darwin_clang_arch(normalized_processor: &str) -> Option<&'static str> {
    match normalized_processor {
        "x86" => Some("i686"),
        "aarch64" => Some("arm64"),
        "x86_64" => Some("x86_64"),
        _ => None,
    }
}

/// CMake `-D...` configure arguments (spec §4.10), wrapped in `(...)` the
/// way the build scripts splice them into a bash array.
pub fn cmake_configure_args(
    compilers: &[(Language, CompilerInfo)],
    system: &SystemInfo,
    build_type_mapped: &str,
) -> String {
    if system.target_sub_type.as_deref() == Some("msvc") {
        return cmake_msvc_configure_args(system, build_type_mapped);
    }

    let mut args = String::from("(");
    args.push_str(&format!("-DCMAKE_BUILD_TYPE={build_type_mapped} "));
    args.push_str(&format!("-DCMAKE_SYSTEM_NAME={} ", system.target_name));
    args.push_str(&format!("-DCMAKE_SYSTEM_PROCESSOR={} ", system.target_processor));

    if system.target_name == "Darwin" {
        if let Some(arch) = darwin_clang_arch(&system.target_processor) {
            args.push_str(&format!("-DCMAKE_OSX_ARCHITECTURES={arch} "));
        }
    }

    for (language, info) in compilers {
        let var = match language {
            Language::C => "CMAKE_C_COMPILER",
            Language::Cxx => "CMAKE_CXX_COMPILER",
        };
        args.push_str(&format!("-D{var}={} ", convert(&info.command, PathStyle::Posix)));
    }

    args.push(')');
    args
}

fn cmake_msvc_configure_args(system: &SystemInfo, build_type_mapped: &str) -> String {
    let mut args = String::from("(");
    args.push_str(&format!("-DCMAKE_CONFIGURATION_TYPES={build_type_mapped} "));

    if let Some(platform) = cmake_generator_platform(&system.target_processor) {
        args.push_str(&format!("-DCMAKE_GENERATOR_PLATFORM={platform} "));
    }

    let vs_install_dir = std::env::var("VSINSTALLDIR").unwrap_or_default();
    let posix = convert(Path::new(&vs_install_dir), PathStyle::Posix);
    args.push_str(&format!("-DCMAKE_GENERATOR_INSTANCE=\"{posix}\" "));

    args.push(')');
    args
}

/// `--config <build type>` for the multi-config MSVC generator; every
/// other generator picks its configuration at configure time, so the
/// build-args string is simply empty.
pub fn cmake_build_args(system: &SystemInfo, build_type_mapped: &str) -> String {
    if system.target_sub_type.as_deref() == Some("msvc") {
        format!("(--config {build_type_mapped})")
    } else {
        String::new()
    }
}
