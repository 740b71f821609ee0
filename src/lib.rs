//! # env-doctor
//!
//! Developer environment diagnostics: checks that the toolchains a project
//! needs (Java, Git, Maven, Docker, Compose) are installed, reachable and new
//! enough, on Windows, macOS and Linux.
//!
//! ## Features
//!
//! - `ProcessRunner` spawns a command with a bounded wait, drains stdout and
//!   stderr concurrently, and kills the child on timeout
//! - `PathResolver` prepends well-known install directories to the search
//!   path each child sees, without touching this process's environment
//! - `ToolDetector` tries a tool's invocation strategies in order until one
//!   finds it, then checks its version policy
//! - `run_all()` drives the whole registry and produces a pass/fail `Report`
//!   with remediation hints
//!
//! ## Example
//!
//! ```rust,no_run
//! use env_doctor::{default_registry, run_all, EnvSnapshot, ProcessRunner, ToolDetector};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let env = EnvSnapshot::capture();
//!     let detector = ToolDetector::new(ProcessRunner::new(&env), env);
//!     let report = run_all(&detector, &default_registry()).await;
//!
//!     for outcome in report.outcomes() {
//!         println!("{}: passed={}", outcome.tool, outcome.passed());
//!     }
//!     std::process::exit(report.exit_code().into());
//! }
//! ```

mod config;
mod detect;
mod detection;
mod env;
mod outcome;
mod registry;
mod report;
mod tool_kind;
mod tool_spec;

pub use config::{ConfigError, DoctorConfig, GRACE_MS_VAR, TIMEOUT_SECS_VAR, VERBOSE_VAR};
pub use detect::{shell_wrap, ToolDetector};
pub use detection::{
    augmented_search_path, extract_version, major_of, CommandRunner, PathResolver, ProcessRunner,
    VersionInfo, DEFAULT_GRACE_PERIOD, PATH_SEPARATOR,
};
pub use env::{EnvSnapshot, HOME_VARS, SEARCH_PATH_VAR};
pub use outcome::{
    CommandResult, DetectionOutcome, FailureReason, InstallRoot, NOT_FOUND_EXIT_CODES,
    SPAWN_FAILURE_EXIT_CODE, TIMEOUT_EXIT_CODE,
};
pub use registry::{default_registry, MIN_DOCKER_MAJOR, MIN_GIT_MAJOR, MIN_JAVA_MAJOR};
pub use report::{run_all, Hint, Report, EXIT_FAIL, EXIT_PASS};
pub use tool_kind::{ToolKind, MAVEN_HOME_VARS};
pub use tool_spec::{Invocation, InvocationStrategy, ReadinessCheck, SettingsLookup, ToolSpec};
