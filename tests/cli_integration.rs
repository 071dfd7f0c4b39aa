//! End-to-end tests against the `cxxpm` binary: package discovery,
//! install, and search-path, driven the way `--package-root` fixtures
//! would be laid out on disk.

use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

use cxxpm::util::hash::{hex_full, sha3_file};

fn cxxpm() -> Command {
    Command::cargo_bin("cxxpm").unwrap()
}

fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn write_meta(pkg_dir: &Path, default_version: &str) {
    std::fs::create_dir_all(pkg_dir).unwrap();
    std::fs::write(pkg_dir.join("meta.build"), format!("DEFAULT_VERSION={default_version}\n")).unwrap();
}

/// Builds a `.tar.gz` containing `bin/hw` under `staging`, returns its full
/// SHA3-256 hex digest.
fn make_archive(staging: &Path, archive_path: &Path, file_contents: &str) -> String {
    std::fs::create_dir_all(staging.join("bin")).unwrap();
    std::fs::write(staging.join("bin").join("hw"), file_contents).unwrap();

    let status = Command::new("tar")
        .arg("-C")
        .arg(staging)
        .arg("-czf")
        .arg(archive_path)
        .arg("bin")
        .status()
        .expect("tar must be on PATH to build the test fixture");
    assert!(status.success(), "failed to build fixture archive");

    hex_full(&sha3_file(archive_path).unwrap())
}

#[test]
fn package_list_lists_package_directories() {
    let root = temp_dir();
    write_meta(&root.path().join("packages").join("hw"), "1.0");
    write_meta(&root.path().join("packages").join("zlib"), "1.3");

    cxxpm()
        .arg("--package-root")
        .arg(root.path())
        .arg("--package-list")
        .assert()
        .success()
        .stdout(predicate::str::contains("hw"))
        .stdout(predicate::str::contains("zlib"));
}

#[test]
fn search_path_fails_for_uninstalled_package() {
    let home = temp_dir();
    let root = temp_dir();
    let pkg_dir = root.path().join("packages").join("hw");
    write_meta(&pkg_dir, "1.0");
    std::fs::write(
        pkg_dir.join("1.0.build"),
        "PACKAGE_TYPE=binary\nLANGS=\nDEPENDS=\nartifacts() { echo '[]'; }\n",
    )
    .unwrap();

    cxxpm()
        .arg("--home")
        .arg(home.path())
        .arg("--package-root")
        .arg(root.path())
        .args(["--search-path", "hw", "--file", "hw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not installed"));
}

#[test]
fn install_and_search_path_roundtrip_for_binary_package() {
    let home = temp_dir();
    let root = temp_dir();
    let staging = temp_dir();

    let host = cxxpm::system::system_name();
    let proc = cxxpm::system::system_processor();
    let var_prefix = format!("{host}_{proc}_");

    let archive_path = home.path().join("hw-1.0.tar.gz");
    let sha3 = make_archive(staging.path(), &archive_path, "hello\n");

    // Pre-seed the download cache so fetch's hash check passes without
    // ever shelling out to `wget`.
    let distr_dir = home.path().join("distr");
    std::fs::create_dir_all(&distr_dir).unwrap();
    std::fs::rename(&archive_path, distr_dir.join("hw-1.0.tar.gz")).unwrap();

    let pkg_dir = root.path().join("packages").join("hw");
    write_meta(&pkg_dir, "1.0");
    std::fs::write(
        pkg_dir.join("1.0.build"),
        format!(
            "PACKAGE_TYPE=binary\nLANGS=\n{var_prefix}TYPE=archive\n{var_prefix}URL=https://example.invalid/hw-1.0.tar.gz\n{var_prefix}SHA3={sha3}\nDEPENDS=\nartifacts() {{ echo '[{{\"type\":\"executable\",\"name\":\"hw\",\"path\":\"bin/hw\"}}]'; }}\n"
        ),
    )
    .unwrap();

    cxxpm()
        .arg("--home")
        .arg(home.path())
        .arg("--package-root")
        .arg(root.path())
        .args(["--install", "hw"])
        .assert()
        .success();

    let prefix = home.path().join("binary-packages").join("hw-1.0");
    assert!(prefix.join("manifest.txt").exists());
    assert!(prefix.join("install").join("bin").join("hw").exists());

    cxxpm()
        .arg("--home")
        .arg(home.path())
        .arg("--package-root")
        .arg(root.path())
        .args(["--search-path", "hw", "--file", "hw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bin"));
}
