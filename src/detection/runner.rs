//! Subprocess execution with a bounded wait and concurrent output capture.

use crate::detection::PathResolver;
use crate::env::{EnvSnapshot, SEARCH_PATH_VAR};
use crate::outcome::{CommandResult, FailureReason};
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

/// How long to wait for the output readers once the process has exited.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(200);

const READ_CHUNK: usize = 8 * 1024;

/// Runs one external command and reports what happened.
///
/// Implementations never fail: every outcome, including a missing
/// executable, is described by the returned [`CommandResult`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run one command to completion or until `timeout` elapses.
    ///
    /// # Arguments
    ///
    /// * `argv` - Program followed by its arguments
    /// * `timeout` - How long to wait before the command is killed
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] in every case. Spawn failures and timeouts are
    /// described by its failure reason rather than returned as errors.
    async fn run(&self, argv: &[String], timeout: Duration) -> CommandResult;

    /// Search path the spawned commands are resolved against, or `None` when
    /// this runner does not spawn real processes.
    fn search_path(&self) -> Option<String> {
        None
    }
}

/// [`CommandRunner`] that spawns real processes.
///
/// Each child gets the caller's environment with the search path replaced
/// by the augmented value from [`PathResolver`]; the runner's own
/// environment is left untouched.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    path_resolver: PathResolver,
    base_path: String,
    grace_period: Duration,
}

impl ProcessRunner {
    /// Runner using the platform resolver and the search path from `env`.
    pub fn new(env: &EnvSnapshot) -> Self {
        Self::with_resolver(PathResolver::from_env(env), env.search_path())
    }

    pub fn with_resolver(path_resolver: PathResolver, base_path: impl Into<String>) -> Self {
        Self {
            path_resolver,
            base_path: base_path.into(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    /// Set how long to wait for output after the process exits.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    fn build_command(&self, program: &str, args: &[String], search_path: &str) -> Command {
        let mut std_command = std::process::Command::new(program);
        std_command
            .args(args)
            .env(SEARCH_PATH_VAR, search_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group, so a timeout kill also reaches anything the
        // child spawned (shell wrappers in particular).
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_command.process_group(0);
        }

        let mut command = Command::from(std_command);
        command.kill_on_drop(true);
        command
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    /// Spawn `argv` with the augmented search path and capture its output.
    ///
    /// # Arguments
    ///
    /// * `argv` - Program followed by its arguments
    /// * `limit` - Time allowed before the child's process group is killed
    ///
    /// # Returns
    ///
    /// `CommandResult` with the exit code and both captured streams, or a
    /// timed-out result with empty output when `limit` elapsed first.
    async fn run(&self, argv: &[String], limit: Duration) -> CommandResult {
        let Some((program, args)) = argv.split_first() else {
            let reason = FailureReason::IoError;
            return CommandResult::failed(Vec::new(), reason, "empty command line");
        };

        let search_path = self.path_resolver.augment(&self.base_path);
        debug!(">> {}", argv.join(" "));

        let mut child = match self.build_command(program, args, &search_path).spawn() {
            Ok(child) => child,
            Err(e) => {
                debug!("spawn failed for `{}`: {}", argv.join(" "), e);
                return CommandResult::spawn_failure(argv.to_vec(), &e);
            }
        };

        // Both streams are drained while we wait; reading them one after the
        // other could deadlock once a pipe buffer fills.
        let stdout = StreamCapture::start(child.stdout.take());
        let stderr = StreamCapture::start(child.stderr.take());

        let status = match timeout(limit, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                warn!("waiting on `{}` failed: {}", argv.join(" "), e);
                terminate(&mut child, self.grace_period).await;
                stdout.abort();
                stderr.abort();
                return CommandResult::failed(argv.to_vec(), FailureReason::IoError, e.to_string());
            }
            Err(_) => {
                warn!("!! TIMEOUT after {:?}: {}", limit, argv.join(" "));
                terminate(&mut child, self.grace_period).await;
                stdout.abort();
                stderr.abort();
                return CommandResult::timed_out(argv.to_vec());
            }
        };

        let (stdout, stderr) = tokio::join!(
            stdout.finish(self.grace_period),
            stderr.finish(self.grace_period)
        );
        let exit_code = exit_code_of(status);

        if !stdout.trim().is_empty() {
            debug!("-- stdout --\n{}", stdout.trim());
        }
        if !stderr.trim().is_empty() {
            debug!("-- stderr --\n{}", stderr.trim());
        }
        debug!("-- exit -- {}", exit_code);

        CommandResult::from_exit(argv.to_vec(), exit_code, stdout, stderr)
    }

    fn search_path(&self) -> Option<String> {
        Some(self.path_resolver.augment(&self.base_path))
    }
}

/// Background reader accumulating one output stream.
///
/// The buffer is shared so that whatever arrived before the grace period
/// ran out can still be returned.
struct StreamCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    task: Option<JoinHandle<()>>,
}

impl StreamCapture {
    fn start<R>(stream: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let task = stream.map(|mut stream| {
            let sink = Arc::clone(&buffer);
            tokio::spawn(async move {
                let mut chunk = [0u8; READ_CHUNK];
                loop {
                    match stream.read(&mut chunk).await {
                        Ok(0) => break,
                        Ok(n) => sink
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .extend_from_slice(&chunk[..n]),
                        Err(e) => {
                            debug!("output stream read failed: {}", e);
                            break;
                        }
                    }
                }
            })
        });
        Self { buffer, task }
    }

    /// Wait up to `grace` for the stream to close, then return what was read.
    async fn finish(mut self, grace: Duration) -> String {
        if let Some(mut task) = self.task.take() {
            if timeout(grace, &mut task).await.is_err() {
                debug!(
                    "output reader still open after {:?}; keeping partial output",
                    grace
                );
                task.abort();
            }
        }
        self.snapshot()
    }

    fn abort(self) {
        if let Some(task) = self.task {
            task.abort();
        }
    }

    fn snapshot(&self) -> String {
        let bytes = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Forcibly stop a child (and its process group on Unix), then reap it.
async fn terminate(child: &mut Child, grace: Duration) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                if e != nix::errno::Errno::ESRCH {
                    debug!("killpg({}) failed: {}", pid, e);
                }
            }
        }
    }

    if let Err(e) = child.start_kill() {
        debug!("kill failed: {}", e);
    }
    if timeout(grace, child.wait()).await.is_err() {
        warn!("child did not exit within {:?} after kill", grace);
    }
}

#[cfg(unix)]
fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code_of(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::PATH_SEPARATOR;
    use std::time::Instant;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn runner() -> ProcessRunner {
        ProcessRunner::new(&EnvSnapshot::capture())
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[tokio::test]
    async fn test_run_nonexistent_executable() {
        let missing = argv(&["definitely_not_a_real_executable_12345"]);
        let result = runner().run(&missing, secs(2)).await;
        assert!(!result.present());
        assert_eq!(result.failure_reason(), Some(FailureReason::NotFound));
        assert_eq!(result.exit_code(), 127);
        assert!(!result.stderr().is_empty());
    }

    #[tokio::test]
    async fn test_run_empty_argv() {
        let result = runner().run(&[], secs(1)).await;
        assert!(!result.present());
        assert_eq!(result.failure_reason(), Some(FailureReason::IoError));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_captures_stdout_and_exit_code() {
        let echo = argv(&["echo", "v1.0.0"]);
        let result = runner().run(&echo, secs(5)).await;
        assert!(result.present());
        assert_eq!(result.exit_code(), 0);
        assert_eq!(result.stdout().trim(), "v1.0.0");
        assert_eq!(result.command_line(), echo.as_slice());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_nonzero_exit_is_present() {
        let script = argv(&["sh", "-c", "echo oops >&2; exit 3"]);
        let result = runner().run(&script, secs(5)).await;
        assert!(result.present());
        assert_eq!(result.exit_code(), 3);
        assert_eq!(result.stderr().trim(), "oops");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_shell_lookup_failure() {
        let script = argv(&["sh", "-c", "definitely_not_a_real_executable_12345"]);
        let result = runner().run(&script, secs(5)).await;
        assert!(!result.present());
        assert_eq!(result.exit_code(), 127);
        let reason = result.failure_reason();
        assert_eq!(reason, Some(FailureReason::ShellLookupFailure));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_timeout_returns_promptly() {
        let sleep = argv(&["sleep", "30"]);
        let start = Instant::now();
        let result = runner().run(&sleep, Duration::from_millis(300)).await;
        assert!(start.elapsed() < secs(3));
        assert!(!result.present());
        assert_eq!(result.failure_reason(), Some(FailureReason::Timeout));
        assert!(result.stdout().is_empty());
    }

    #[test]
    fn test_search_path_is_augmented() {
        let resolver = PathResolver::with_dirs(["/opt/tool/bin"]);
        let runner = ProcessRunner::with_resolver(resolver, "/usr/bin");
        let expected = format!("/opt/tool/bin{}/usr/bin", PATH_SEPARATOR);
        assert_eq!(runner.search_path(), Some(expected));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_child_sees_augmented_path() {
        let resolver = PathResolver::with_dirs(["/opt/env-doctor-test/bin"]);
        let runner = ProcessRunner::with_resolver(resolver, "/usr/bin:/bin");
        let script = argv(&["/bin/sh", "-c", "echo \"$PATH\""]);
        let result = runner.run(&script, secs(5)).await;
        assert_eq!(
            result.stdout().trim(),
            "/opt/env-doctor-test/bin:/usr/bin:/bin"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_grace_period_bounds_inherited_pipe() {
        // The background sleep keeps stdout open after the shell exits.
        let runner = runner().with_grace_period(Duration::from_millis(200));
        let script = argv(&["sh", "-c", "echo early; sleep 5 &"]);
        let start = Instant::now();
        let result = runner.run(&script, secs(5)).await;
        assert!(start.elapsed() < secs(3));
        assert!(result.present());
        assert_eq!(result.exit_code(), 0);
        assert_eq!(result.stdout().trim(), "early");
    }
}
