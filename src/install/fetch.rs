//! Fetch + extract (spec §4.7 step 5). Everything here shells out to
//! `wget`/`tar`/`unzip`/`unzstd`/`git`; this module never parses archive
//! or git-protocol bytes itself.

use std::path::{Path, PathBuf};

use crate::error::CxxpmError;
use crate::util::hash::{hex_full, sha3_file};
use crate::util::process::ProcessRunner;

#[derive(Debug, Clone)]
pub enum FetchSpec {
    Archive {
        url: String,
        sha3: String,
    },
    Git {
        url: String,
        tag: Option<String>,
        commit: Option<String>,
    },
}

/// Derives the cache filename from the URL's final path segment.
fn archive_filename(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Downloads (if not already cached with a matching hash) and extracts an
/// archive into `dest`. On hash mismatch, deletes the cached file and
/// retries the download exactly once.
pub fn fetch_archive(
    url: &str,
    expected_sha3: &str,
    distr_dir: &Path,
    dest: &Path,
    runner: &ProcessRunner,
) -> Result<(), CxxpmError> {
    let filename = archive_filename(url);
    let cached = distr_dir.join(filename);

    let mut attempts = 0;
    loop {
        let needs_download = match sha3_file(&cached) {
            Ok(digest) => hex_full(&digest) != expected_sha3,
            Err(_) => true,
        };

        if needs_download {
            if cached.exists() {
                let _ = std::fs::remove_file(&cached);
            }
            std::fs::create_dir_all(distr_dir)?;
            let ok = runner
                .run_no_capture(
                    distr_dir,
                    Path::new("wget"),
                    &["-O".to_string(), filename.to_string(), url.to_string()],
                    &[],
                    true,
                )
                .map_err(|_| hash_mismatch_err(&cached, expected_sha3))?;
            if !ok {
                return Err(hash_mismatch_err(&cached, expected_sha3));
            }
        }

        let digest = sha3_file(&cached).map_err(|_| hash_mismatch_err(&cached, expected_sha3))?;
        let actual = hex_full(&digest);
        if actual == expected_sha3 {
            break;
        }
        attempts += 1;
        if attempts >= 2 {
            return Err(CxxpmError::HashMismatch {
                path: cached.clone(),
                expected: expected_sha3.to_string(),
                actual,
            });
        }
    }

    extract(&cached, dest, runner)
}

fn hash_mismatch_err(path: &Path, expected: &str) -> CxxpmError {
    CxxpmError::HashMismatch {
        path: path.to_path_buf(),
        expected: expected.to_string(),
        actual: String::new(),
    }
}

fn extract(archive: &Path, dest: &Path, runner: &ProcessRunner) -> Result<(), CxxpmError> {
    std::fs::create_dir_all(dest)?;
    let name = archive.to_string_lossy();

    let (program, args): (&str, Vec<String>) = if name.ends_with(".zip") {
        ("unzip", vec!["-d".to_string(), dest.to_string_lossy().into_owned(), name.to_string()])
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        ("tar", vec!["-xzf".to_string(), name.to_string(), "-C".to_string(), dest.to_string_lossy().into_owned()])
    } else if name.ends_with(".tar.bz2") {
        ("tar", vec!["-xjf".to_string(), name.to_string(), "-C".to_string(), dest.to_string_lossy().into_owned()])
    } else if name.ends_with(".tar.lz") || name.ends_with(".tar.lzma") {
        ("tar", vec!["--lzip".to_string(), "-xvf".to_string(), name.to_string(), "-C".to_string(), dest.to_string_lossy().into_owned()])
    } else if name.ends_with(".tar.zst") {
        return extract_zstd(archive, dest, runner);
    } else {
        return Err(CxxpmError::UnknownArchiveType(archive.to_path_buf()));
    };

    let ok = runner
        .run_no_capture(dest, Path::new(program), &args, &[], true)
        .map_err(|_| CxxpmError::UnknownArchiveType(archive.to_path_buf()))?;
    if !ok {
        return Err(CxxpmError::UnknownArchiveType(archive.to_path_buf()));
    }
    Ok(())
}

fn extract_zstd(archive: &Path, dest: &Path, runner: &ProcessRunner) -> Result<(), CxxpmError> {
    let tmp = tempfile::Builder::new()
        .suffix(".tar")
        .tempfile()
        .map_err(|_| CxxpmError::UnknownArchiveType(archive.to_path_buf()))?;
    let ok = runner
        .run_no_capture(
            dest,
            Path::new("unzstd"),
            &[
                "-f".to_string(),
                "-o".to_string(),
                tmp.path().to_string_lossy().into_owned(),
                archive.to_string_lossy().into_owned(),
            ],
            &[],
            true,
        )
        .map_err(|_| CxxpmError::UnknownArchiveType(archive.to_path_buf()))?;
    if !ok {
        return Err(CxxpmError::UnknownArchiveType(archive.to_path_buf()));
    }

    let ok = runner
        .run_no_capture(
            dest,
            Path::new("tar"),
            &["-xf".to_string(), tmp.path().to_string_lossy().into_owned(), "-C".to_string(), dest.to_string_lossy().into_owned()],
            &[],
            true,
        )
        .map_err(|_| CxxpmError::UnknownArchiveType(archive.to_path_buf()))?;
    if !ok {
        return Err(CxxpmError::UnknownArchiveType(archive.to_path_buf()));
    }
    Ok(())
}

/// Clones `url` into `dest`, optionally checking out `tag` and hard-
/// resetting to `commit`.
pub fn fetch_git(
    url: &str,
    tag: Option<&str>,
    commit: Option<&str>,
    dest: &Path,
    runner: &ProcessRunner,
) -> Result<(), CxxpmError> {
    std::fs::create_dir_all(dest)?;

    let mut args = vec!["clone".to_string(), url.to_string(), ".".to_string()];
    if let Some(tag) = tag {
        args.push("-b".to_string());
        args.push(tag.to_string());
    }
    let ok = runner
        .run_no_capture(dest, Path::new("git"), &args, &[], true)
        .map_err(|_| git_fail(dest))?;
    if !ok {
        return Err(git_fail(dest));
    }

    if let Some(commit) = commit {
        let ok = runner
            .run_no_capture(
                dest,
                Path::new("git"),
                &["reset".to_string(), "--hard".to_string(), commit.to_string()],
                &[],
                true,
            )
            .map_err(|_| git_fail(dest))?;
        if !ok {
            return Err(git_fail(dest));
        }
    }

    Ok(())
}

fn git_fail(dest: &Path) -> CxxpmError {
    CxxpmError::GitOperationFailed(PathBuf::from(dest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_filename_takes_url_tail() {
        assert_eq!(archive_filename("https://example.com/a/b/hw-1.0.tar.gz"), "hw-1.0.tar.gz");
    }
}
