//! Declarative description of how to find a tool.

use std::path::PathBuf;
use std::time::Duration;

/// One way of invoking a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Execute the argv as-is.
    Direct(Vec<String>),

    /// Run the argv through the platform shell (`cmd /c` on Windows,
    /// `sh -c` elsewhere). Needed for tools shipped as script or batch
    /// launchers rather than native binaries.
    Shell(Vec<String>),

    /// Run `<install root>/bin/<executable>` with `args`, where the root is
    /// read from the spec's installation-root variables.
    InstallRoot {
        executable: String,
        args: Vec<String>,
        shell: bool,
    },
}

/// An [`Invocation`] with its per-attempt time limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationStrategy {
    pub invocation: Invocation,
    pub timeout: Duration,
}

impl InvocationStrategy {
    pub fn direct<I, S>(argv: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            invocation: Invocation::Direct(collect_args(argv)),
            timeout,
        }
    }

    pub fn shell<I, S>(argv: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            invocation: Invocation::Shell(collect_args(argv)),
            timeout,
        }
    }

    pub fn install_root<I, S>(
        executable: impl Into<String>,
        args: I,
        shell: bool,
        timeout: Duration,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            invocation: Invocation::InstallRoot {
                executable: executable.into(),
                args: collect_args(args),
                shell,
            },
            timeout,
        }
    }
}

/// Follow-up command run once a tool is known to be present; exit code 0
/// means ready (e.g. a container daemon answering).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessCheck {
    pub argv: Vec<String>,
    pub timeout: Duration,
    /// Advice shown when the check fails.
    pub hint: String,
}

/// A configuration file looked for under the user's home directory first,
/// then under the tool's installation root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsLookup {
    /// Relative to the home directory, e.g. `.m2/settings.xml`.
    pub user_path: PathBuf,
    /// Relative to the installation root, e.g. `conf/settings.xml`.
    pub install_path: PathBuf,
}

impl SettingsLookup {
    /// File name used to label the lookup in reports.
    ///
    /// ```rust
    /// use env_doctor::SettingsLookup;
    /// use std::path::Path;
    ///
    /// let lookup = SettingsLookup {
    ///     user_path: Path::new(".m2").join("settings.xml"),
    ///     install_path: Path::new("conf").join("settings.xml"),
    /// };
    /// assert_eq!(lookup.label(), "settings.xml");
    /// ```
    pub fn label(&self) -> String {
        let name = self.user_path.file_name();
        name.unwrap_or(self.user_path.as_os_str())
            .to_string_lossy()
            .into_owned()
    }
}

/// Everything needed to detect one logical tool.
///
/// Strategies are tried in order and the first one that finds the tool wins.
///
/// # Example
///
/// ```rust
/// use env_doctor::{InvocationStrategy, ToolSpec};
/// use std::time::Duration;
///
/// let spec = ToolSpec::new("Git")
///     .with_strategy(InvocationStrategy::direct(["git", "--version"], Duration::from_secs(5)))
///     .with_minimum_major(2);
/// assert!(spec.mandatory);
/// assert_eq!(spec.strategies.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: String,
    pub strategies: Vec<InvocationStrategy>,
    pub minimum_major: Option<u64>,
    /// Evaluate the policy with `1.x` read as major `x`.
    pub legacy_major: bool,
    /// Whether this tool counts toward the overall verdict.
    pub mandatory: bool,
    pub readiness: Option<ReadinessCheck>,
    /// Installation-root variables, first non-blank wins.
    pub install_root_vars: Vec<String>,
    /// Remediation lines shown when the tool is missing.
    pub remediation: Vec<String>,
    /// Settings file reported alongside the tool, if it has one.
    pub settings: Option<SettingsLookup>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategies: Vec::new(),
            minimum_major: None,
            legacy_major: false,
            mandatory: true,
            readiness: None,
            install_root_vars: Vec::new(),
            remediation: Vec::new(),
            settings: None,
        }
    }

    pub fn with_strategy(mut self, strategy: InvocationStrategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn with_minimum_major(mut self, major: u64) -> Self {
        self.minimum_major = Some(major);
        self
    }

    pub fn with_legacy_major(mut self) -> Self {
        self.legacy_major = true;
        self
    }

    /// Report this tool but leave it out of the overall verdict.
    pub fn optional(mut self) -> Self {
        self.mandatory = false;
        self
    }

    pub fn with_readiness<I, S>(
        mut self,
        argv: I,
        timeout: Duration,
        hint: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.readiness = Some(ReadinessCheck {
            argv: collect_args(argv),
            timeout,
            hint: hint.into(),
        });
        self
    }

    pub fn with_install_root_vars<I, S>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.install_root_vars = collect_args(vars);
        self
    }

    pub fn with_remediation(mut self, line: impl Into<String>) -> Self {
        self.remediation.push(line.into());
        self
    }

    /// Report the settings file found at `user_path` under the home
    /// directory, or else at `install_path` under the installation root.
    pub fn with_settings_lookup(
        mut self,
        user_path: impl Into<PathBuf>,
        install_path: impl Into<PathBuf>,
    ) -> Self {
        self.settings = Some(SettingsLookup {
            user_path: user_path.into(),
            install_path: install_path.into(),
        });
        self
    }
}

fn collect_args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}
