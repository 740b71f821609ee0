//! Result types produced by command execution and tool detection.

use crate::detection::VersionInfo;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes a shell uses to report that it could not find the command:
/// 127 from POSIX shells, 9009 from Windows `cmd`.
pub const NOT_FOUND_EXIT_CODES: &[i32] = &[127, 9009];

/// Exit code recorded when the executable could not be started at all.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

/// Exit code recorded when the process was killed after its timeout.
pub const TIMEOUT_EXIT_CODE: i32 = -1;

/// Why an invocation did not find the tool.
///
/// These are data on [`CommandResult`], never raised: a missing tool is an
/// expected outcome of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Error)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum FailureReason {
    /// The executable could not be located or started.
    #[error("executable not found")]
    NotFound,

    /// The process did not exit within its time limit and was killed.
    #[error("timed out")]
    Timeout,

    /// A shell started but reported the command as unknown.
    #[error("shell could not find the command")]
    ShellLookupFailure,

    /// Spawning or waiting on the process failed unexpectedly.
    #[error("I/O error")]
    IoError,

    /// Detection itself faulted for this tool.
    #[error("internal detection fault")]
    Internal,
}

impl FailureReason {
    /// Stable short identifier, as used in diagnostics.
    ///
    /// # Example
    ///
    /// ```rust
    /// use env_doctor::FailureReason;
    ///
    /// assert_eq!(FailureReason::Timeout.as_str(), "timeout");
    /// assert_eq!(FailureReason::NotFound.as_str(), "not-found");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::Timeout => "timeout",
            Self::ShellLookupFailure => "shell-lookup-failure",
            Self::IoError => "io-error",
            Self::Internal => "internal",
        }
    }
}

/// Outcome of a single invocation attempt.
///
/// Built once per attempt and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    present: bool,
    exit_code: i32,
    stdout: String,
    stderr: String,
    command_line: Vec<String>,
    failure_reason: Option<FailureReason>,
}

impl CommandResult {
    /// Result for a process that ran to completion.
    ///
    /// Any exit code counts as present except the shell "command not found"
    /// codes in [`NOT_FOUND_EXIT_CODES`].
    pub fn from_exit(
        command_line: Vec<String>,
        exit_code: i32,
        stdout: String,
        stderr: String,
    ) -> Self {
        let lookup_failed = NOT_FOUND_EXIT_CODES.contains(&exit_code);
        Self {
            present: !lookup_failed,
            exit_code,
            stdout,
            stderr,
            command_line,
            failure_reason: lookup_failed.then_some(FailureReason::ShellLookupFailure),
        }
    }

    /// Result for a process killed after exceeding its time limit.
    pub fn timed_out(command_line: Vec<String>) -> Self {
        Self {
            present: false,
            exit_code: TIMEOUT_EXIT_CODE,
            stdout: String::new(),
            stderr: String::new(),
            command_line,
            failure_reason: Some(FailureReason::Timeout),
        }
    }

    /// Result for a process that could not be started.
    pub fn spawn_failure(command_line: Vec<String>, error: &io::Error) -> Self {
        let reason = match error.kind() {
            io::ErrorKind::NotFound => FailureReason::NotFound,
            _ => FailureReason::IoError,
        };
        Self::failed(command_line, reason, error.to_string())
    }

    /// Result for a tool that could not be located without running anything.
    pub fn not_found(command_line: Vec<String>, message: impl Into<String>) -> Self {
        Self::failed(command_line, FailureReason::NotFound, message)
    }

    /// A failed attempt with the given reason; `message` lands in stderr.
    pub fn failed(
        command_line: Vec<String>,
        reason: FailureReason,
        message: impl Into<String>,
    ) -> Self {
        Self {
            present: false,
            exit_code: SPAWN_FAILURE_EXIT_CODE,
            stdout: String::new(),
            stderr: message.into(),
            command_line,
            failure_reason: Some(reason),
        }
    }

    pub fn present(&self) -> bool {
        self.present
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// The exact argv that was executed.
    pub fn command_line(&self) -> &[String] {
        &self.command_line
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        self.failure_reason
    }

    /// The argv joined with spaces, for display.
    pub fn display_command(&self) -> String {
        self.command_line.join(" ")
    }

    /// Stdout followed by stderr, trimmed. Version banners land on either
    /// stream depending on the tool.
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
            .trim()
            .to_string()
    }
}

/// Installation root a tool was configured with, e.g. `MAVEN_HOME`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallRoot {
    /// Variable the root was read from.
    pub var: String,
    pub path: PathBuf,
}

/// Result of detecting one tool.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionOutcome {
    /// Tool name from its spec.
    pub tool: String,

    /// Result of the first strategy that found the tool, or of the last
    /// strategy attempted when none did.
    pub result: CommandResult,

    /// Version parsed from the output. Always `None` when the tool is absent.
    pub version: Option<VersionInfo>,

    /// Major number the policy was evaluated against.
    pub major: Option<u64>,

    /// Minimum major version required, if any.
    pub minimum_major: Option<u64>,

    /// Present and, when a minimum is configured, new enough.
    pub policy_passed: bool,

    /// Result of the readiness check, when the tool has one and is present.
    pub ready: Option<bool>,

    /// Whether this tool takes part in the overall verdict.
    pub mandatory: bool,

    /// Where the winning program resolves on the augmented search path.
    pub location: Option<PathBuf>,

    /// The installation root in effect for this tool, if it uses one.
    pub install_root: Option<InstallRoot>,

    /// Settings file found for this tool. Always `None` for tools that do
    /// not declare a settings lookup.
    pub settings_file: Option<PathBuf>,
}

impl DetectionOutcome {
    /// Whether the tool was found at all.
    pub fn is_present(&self) -> bool {
        self.result.present()
    }

    /// Policy satisfied and, when a readiness check ran, the tool is ready.
    pub fn passed(&self) -> bool {
        self.policy_passed && self.ready != Some(false)
    }
}
