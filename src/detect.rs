//! Tool detection: run a tool's strategies in order until one finds it.

use crate::detection::{augmented_search_path, extract_version, CommandRunner, VersionInfo};
use crate::env::EnvSnapshot;
use crate::outcome::{CommandResult, DetectionOutcome, InstallRoot};
use crate::tool_spec::{Invocation, InvocationStrategy, SettingsLookup, ToolSpec};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Detects tools described by [`ToolSpec`]s.
///
/// Strategies are evaluated strictly in declared order and evaluation stops
/// at the first one whose result is present. Nothing is retried after that.
///
/// # Example
///
/// ```rust,no_run
/// use env_doctor::{EnvSnapshot, ProcessRunner, ToolDetector, ToolKind};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let env = EnvSnapshot::capture();
///     let detector = ToolDetector::new(ProcessRunner::new(&env), env);
///     let outcome = detector.detect(&ToolKind::Git.spec()).await;
///     println!("git present: {}", outcome.is_present());
/// }
/// ```
pub struct ToolDetector<R> {
    runner: R,
    env: EnvSnapshot,
    search_path: String,
    timeout_override: Option<Duration>,
}

/// A strategy turned into a concrete argv.
struct ResolvedInvocation {
    argv: Vec<String>,
    /// The program the tool itself is launched as, inside any shell wrapper.
    program: String,
}

impl<R: CommandRunner> ToolDetector<R> {
    /// Detector that runs commands through `runner`.
    ///
    /// Locations are resolved on the runner's own search path, or on the
    /// path augmented from `env` when the runner does not report one.
    pub fn new(runner: R, env: EnvSnapshot) -> Self {
        let search_path = runner
            .search_path()
            .unwrap_or_else(|| augmented_search_path(env.search_path(), &env));
        Self {
            runner,
            env,
            search_path,
            timeout_override: None,
        }
    }

    /// Use `limit` for every attempt instead of each strategy's own timeout.
    pub fn with_timeout_override(mut self, limit: Option<Duration>) -> Self {
        self.timeout_override = limit;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Detect one tool and evaluate its version policy.
    ///
    /// # Arguments
    ///
    /// * `spec` - The tool to look for and the policy it must satisfy
    ///
    /// # Returns
    ///
    /// A [`DetectionOutcome`] built from the first strategy that found the
    /// tool, or from the last one attempted when none did. A missing tool is
    /// reported in the outcome, never as an error.
    pub async fn detect(&self, spec: &ToolSpec) -> DetectionOutcome {
        let mut attempt: Option<(CommandResult, String)> = None;

        for strategy in &spec.strategies {
            let resolved = match self.resolve(spec, strategy) {
                Ok(resolved) => resolved,
                Err(unresolved) => {
                    debug!("{}: strategy skipped: {}", spec.name, unresolved.stderr());
                    attempt = Some((unresolved, String::new()));
                    continue;
                }
            };

            let limit = self.limit(strategy.timeout);
            let result = self.runner.run(&resolved.argv, limit).await;
            let found = result.present();
            attempt = Some((result, resolved.program));
            if found {
                break;
            }
        }

        let (result, program) = attempt.unwrap_or_else(|| {
            let argv = vec![spec.name.clone()];
            let result = CommandResult::not_found(argv, "no invocation strategies declared");
            (result, String::new())
        });

        self.evaluate(spec, result, &program).await
    }

    async fn evaluate(
        &self,
        spec: &ToolSpec,
        result: CommandResult,
        program: &str,
    ) -> DetectionOutcome {
        let present = result.present();
        let version = if present {
            extract_version(&result.combined_output())
        } else {
            None
        };
        let major = version.as_ref().map(|v| policy_major(spec, v));
        let minimum_met = match spec.minimum_major {
            Some(minimum) => major.unwrap_or(0) >= minimum,
            None => true,
        };
        let policy_passed = present && minimum_met;

        let ready = match (&spec.readiness, present) {
            (Some(check), true) => {
                let limit = self.limit(check.timeout);
                let answer = self.runner.run(&check.argv, limit).await;
                Some(answer.present() && answer.exit_code() == 0)
            }
            _ => None,
        };

        let location = present.then(|| self.locate(program)).flatten();
        let install_root = self.install_root(spec);
        let settings_file = spec
            .settings
            .as_ref()
            .and_then(|lookup| self.find_settings(lookup, install_root.as_ref()));

        if present {
            let shown = match &version {
                Some(version) => version.to_string(),
                None => String::new(),
            };
            info!(
                tool = %spec.name,
                version = %shown,
                policy_passed,
                "detected"
            );
        } else {
            let reason = result.failure_reason().map_or("unknown", |r| r.as_str());
            info!(
                tool = %spec.name,
                reason,
                command = %result.display_command(),
                "not detected"
            );
        }

        DetectionOutcome {
            tool: spec.name.clone(),
            result,
            version,
            major,
            minimum_major: spec.minimum_major,
            policy_passed,
            ready,
            mandatory: spec.mandatory,
            location,
            install_root,
            settings_file,
        }
    }

    fn limit(&self, strategy_timeout: Duration) -> Duration {
        self.timeout_override.unwrap_or(strategy_timeout)
    }

    /// Turn a strategy into an argv, or explain why it cannot be attempted.
    fn resolve(
        &self,
        spec: &ToolSpec,
        strategy: &InvocationStrategy,
    ) -> Result<ResolvedInvocation, CommandResult> {
        match &strategy.invocation {
            Invocation::Direct(argv) => Ok(ResolvedInvocation {
                program: argv.first().cloned().unwrap_or_default(),
                argv: argv.clone(),
            }),
            Invocation::Shell(argv) => Ok(ResolvedInvocation {
                program: argv.first().cloned().unwrap_or_default(),
                argv: shell_wrap(argv),
            }),
            Invocation::InstallRoot {
                executable,
                args,
                shell,
            } => self.resolve_install_root(spec, executable, args, *shell),
        }
    }

    /// Absolute-path fallback: `<install root>/bin/<executable>`.
    fn resolve_install_root(
        &self,
        spec: &ToolSpec,
        executable: &str,
        args: &[String],
        shell: bool,
    ) -> Result<ResolvedInvocation, CommandResult> {
        let mut attempted = vec![executable.to_string()];
        attempted.extend_from_slice(args);

        let Some(root) = self.install_root(spec) else {
            let message = format!(
                "{} not found on PATH and none of {} is set",
                executable,
                spec.install_root_vars.join("/")
            );
            return Err(CommandResult::not_found(attempted, message));
        };

        let path = root.path.join("bin").join(executable);
        if !path.is_file() {
            let message = format!(
                "{} (from {}) is not a regular file",
                path.display(),
                root.var
            );
            return Err(CommandResult::not_found(attempted, message));
        }
        ensure_executable(&path);

        let program = path.to_string_lossy().into_owned();
        let mut argv = vec![program.clone()];
        argv.extend_from_slice(args);
        if shell {
            argv = shell_wrap(&argv);
        }
        Ok(ResolvedInvocation { argv, program })
    }

    /// Installation root from the first non-blank of the spec's variables.
    fn install_root(&self, spec: &ToolSpec) -> Option<InstallRoot> {
        let vars = spec.install_root_vars.as_slice();
        let (var, path) = self.env.first_non_empty(vars)?;
        Some(InstallRoot {
            var: var.to_string(),
            path: PathBuf::from(path.trim()),
        })
    }

    /// First regular file among the home-directory candidate and the
    /// installation-root candidate, in that order.
    fn find_settings(
        &self,
        lookup: &SettingsLookup,
        install_root: Option<&InstallRoot>,
    ) -> Option<PathBuf> {
        let home = self.env.home_dir();
        let in_home = home.map(|home| home.join(&lookup.user_path));
        let in_root = install_root.map(|root| root.path.join(&lookup.install_path));
        in_home
            .into_iter()
            .chain(in_root)
            .find(|path| path.is_file())
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        if program.is_empty() {
            return None;
        }
        let cwd = std::env::current_dir().ok()?;
        which::which_in(program, Some(&self.search_path), cwd).ok()
    }
}

fn policy_major(spec: &ToolSpec, version: &VersionInfo) -> u64 {
    if spec.legacy_major {
        version.legacy_major()
    } else {
        version.major
    }
}

/// Wrap an argv so it runs through the platform shell.
///
/// # Example
///
/// ```rust
/// let argv = vec!["mvn".to_string(), "-v".to_string()];
/// let wrapped = env_doctor::shell_wrap(&argv);
/// if cfg!(windows) {
///     assert_eq!(wrapped, ["cmd", "/c", "mvn", "-v"]);
/// } else {
///     assert_eq!(wrapped, ["sh", "-c", "mvn -v"]);
/// }
/// ```
pub fn shell_wrap(argv: &[String]) -> Vec<String> {
    if cfg!(windows) {
        let mut wrapped = vec!["cmd".to_string(), "/c".to_string()];
        wrapped.extend_from_slice(argv);
        wrapped
    } else {
        let quoted: Vec<String> = argv.iter().map(|arg| sh_quote(arg)).collect();
        vec!["sh".to_string(), "-c".to_string(), quoted.join(" ")]
    }
}

fn sh_quote(arg: &str) -> String {
    let is_plain = |c: char| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c);
    if !arg.is_empty() && arg.chars().all(is_plain) {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Set the execute bits on a discovered launcher. Idempotent; failures are
/// logged and the invocation is attempted anyway.
#[cfg(unix)]
fn ensure_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let Ok(metadata) = std::fs::metadata(path) else {
        return;
    };
    let mut perms = metadata.permissions();
    let mode = perms.mode();
    if mode & 0o111 == 0o111 {
        return;
    }
    perms.set_mode(mode | 0o111);
    if let Err(e) = std::fs::set_permissions(path, perms) {
        warn!("could not mark {} executable: {}", path.display(), e);
    }
}

#[cfg(not(unix))]
fn ensure_executable(_path: &Path) {}
