//! Subprocess execution in the three modes the install/export core needs:
//! captured, teed-log, and inherited-stdio. All three block the caller.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};

use super::path_cache::PathCache;

/// Children are recorded here so that a fatal-signal handler installed by
/// the binary entry point can tear down the whole process tree. This is a
/// best-effort analogue of the original's OS job/process-group handle: the
/// only process-wide global this crate carries, by design (see DESIGN.md).
static SPAWNED_CHILDREN: Mutex<Vec<u32>> = Mutex::new(Vec::new());

#[cfg(unix)]
fn assign_to_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    // A new process group rooted at the child, so it can be torn down as a
    // unit, mirroring the original's job-object/process-group semantics.
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn assign_to_group(_cmd: &mut Command) {}

fn record_child(pid: u32) {
    SPAWNED_CHILDREN.lock().unwrap().push(pid);
}

fn forget_child(pid: u32) {
    SPAWNED_CHILDREN.lock().unwrap().retain(|p| *p != pid);
}

/// Kill every process group spawned by this process. Call from a fatal
/// signal handler installed in `main()`.
pub fn terminate_all_children() {
    let pids: Vec<u32> = SPAWNED_CHILDREN.lock().unwrap().drain(..).collect();
    for pid in pids {
        #[cfg(unix)]
        unsafe {
            libc_kill(-(pid as i32));
        }
        #[cfg(not(unix))]
        let _ = pid;
    }
}

#[cfg(unix)]
unsafe fn libc_kill(pid: i32) {
    // SIGTERM = 15. Avoid a libc dependency for a single syscall.
    extern "C" {
        fn kill(pid: i32, sig: i32) -> i32;
    }
    kill(pid, 15);
}

#[cfg(unix)]
extern "C" fn handle_fatal_signal(_sig: i32) {
    terminate_all_children();
    std::process::exit(130);
}

/// Installs a SIGINT/SIGTERM handler that tears down every process group
/// this process has spawned before exiting. Call once from `main()`.
#[cfg(unix)]
pub fn install_fatal_signal_handler() {
    extern "C" {
        fn signal(signum: i32, handler: usize) -> usize;
    }
    const SIGINT: i32 = 2;
    const SIGTERM: i32 = 15;
    unsafe {
        signal(SIGINT, handle_fatal_signal as usize);
        signal(SIGTERM, handle_fatal_signal as usize);
    }
}

#[cfg(not(unix))]
pub fn install_fatal_signal_handler() {}

/// Output captured from a fully-captured run.
pub struct CapturedRun {
    pub full_path: PathBuf,
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

/// Spawns child processes, resolving relative programs through a
/// [`PathCache`], and composing the child environment from the parent's
/// environment plus caller-supplied overrides (duplicate names: last wins).
pub struct ProcessRunner<'a> {
    path_cache: &'a PathCache,
}

impl<'a> ProcessRunner<'a> {
    pub fn new(path_cache: &'a PathCache) -> Self {
        ProcessRunner { path_cache }
    }

    pub fn path_cache(&self) -> &PathCache {
        self.path_cache
    }

    fn resolve(&self, program: &Path, must_exist: bool) -> Result<PathBuf> {
        match self.path_cache.resolve(program) {
            Some(p) => Ok(p),
            None => {
                if must_exist {
                    bail!("can't find executable {}", program.display());
                }
                bail!("executable not found: {}", program.display())
            }
        }
    }

    fn base_command(&self, full_path: &Path, cwd: &Path, args: &[String], extra_env: &[String]) -> Command {
        let mut cmd = Command::new(full_path);
        cmd.args(args);
        cmd.current_dir(cwd);
        for kv in extra_env {
            if let Some((k, v)) = kv.split_once('=') {
                cmd.env(k, v);
            }
        }
        assign_to_group(&mut cmd);
        cmd
    }

    /// Fully captures stdout/stderr; returns `true` iff the exit status is 0.
    pub fn run(
        &self,
        cwd: &Path,
        program: &Path,
        args: &[String],
        extra_env: &[String],
        must_exist: bool,
    ) -> Result<CapturedRun> {
        let full_path = match self.resolve(program, must_exist) {
            Ok(p) => p,
            Err(e) => {
                if must_exist {
                    return Err(e);
                }
                return Ok(CapturedRun {
                    full_path: PathBuf::new(),
                    stdout: String::new(),
                    stderr: String::new(),
                    success: false,
                });
            }
        };

        tracing::debug!(program = %full_path.display(), ?args, "spawning process (captured)");

        let mut cmd = self.base_command(&full_path, cwd, args, extra_env);
        let child = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", full_path.display()))?;

        let pid = child.id();
        record_child(pid);
        let output = child
            .wait_with_output()
            .with_context(|| format!("failed to wait for `{}`", full_path.display()))?;
        forget_child(pid);

        let success = output.status.success();
        tracing::debug!(%success, "process exited");

        Ok(CapturedRun {
            full_path,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success,
        })
    }

    /// Merges stdout/stderr and streams them to both `log` and the parent's
    /// own stdout as they arrive.
    pub fn run_capture_log(
        &self,
        cwd: &Path,
        program: &Path,
        args: &[String],
        extra_env: &[String],
        log: &mut File,
        must_exist: bool,
    ) -> Result<bool> {
        let full_path = self.resolve(program, must_exist)?;
        tracing::info!(program = %full_path.display(), ?args, "running build step");

        let mut cmd = self.base_command(&full_path, cwd, args, extra_env);
        let mut child = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", full_path.display()))?;

        let pid = child.id();
        record_child(pid);

        let mut stdout = child.stdout.take().expect("piped stdout");
        let mut stderr = child.stderr.take().expect("piped stderr");
        let mut buf = [0u8; 4096];
        loop {
            let n = stdout.read(&mut buf).unwrap_or(0);
            if n == 0 {
                break;
            }
            log.write_all(&buf[..n]).ok();
            std::io::stdout().write_all(&buf[..n]).ok();
        }
        loop {
            let n = stderr.read(&mut buf).unwrap_or(0);
            if n == 0 {
                break;
            }
            log.write_all(&buf[..n]).ok();
            std::io::stdout().write_all(&buf[..n]).ok();
        }

        let status = child
            .wait()
            .with_context(|| format!("failed to wait for `{}`", full_path.display()))?;
        forget_child(pid);

        Ok(status.success())
    }

    /// Inherits the parent's stdio directly.
    pub fn run_no_capture(
        &self,
        cwd: &Path,
        program: &Path,
        args: &[String],
        extra_env: &[String],
        must_exist: bool,
    ) -> Result<bool> {
        let full_path = self.resolve(program, must_exist)?;
        let mut cmd = self.base_command(&full_path, cwd, args, extra_env);
        let mut child = cmd
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", full_path.display()))?;

        let pid = child.id();
        record_child(pid);
        let status = child.wait()?;
        forget_child(pid);
        Ok(status.success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_captures_stdout() {
        let cache = PathCache::new();
        let runner = ProcessRunner::new(&cache);
        let result = runner
            .run(
                Path::new("."),
                Path::new("echo"),
                &["hello".to_string()],
                &[],
                true,
            )
            .unwrap();
        assert!(result.success);
        assert!(result.stdout.contains("hello"));
    }

    #[test]
    fn run_missing_executable_is_soft_failure() {
        let cache = PathCache::new();
        let runner = ProcessRunner::new(&cache);
        let result = runner
            .run(
                Path::new("."),
                Path::new("__definitely_not_a_real_binary__"),
                &[],
                &[],
                false,
            )
            .unwrap();
        assert!(!result.success);
    }

    #[test]
    fn extra_env_last_wins() {
        let cache = PathCache::new();
        let runner = ProcessRunner::new(&cache);
        let result = runner
            .run(
                Path::new("."),
                Path::new("sh"),
                &["-c".to_string(), "echo $FOO".to_string()],
                &["FOO=first".to_string(), "FOO=second".to_string()],
                true,
            )
            .unwrap();
        assert_eq!(result.stdout.trim(), "second");
    }
}
