//! Default tool specifications.
//!
//! Per-platform launcher differences live here as data. On Windows Maven
//! ships as `mvn.cmd` and runs through the shell; elsewhere `mvn` is run
//! directly. Either way it falls back to `$MAVEN_HOME/bin` when the search
//! path does not have it.

use crate::tool_kind::{ToolKind, MAVEN_HOME_VARS};
use crate::tool_spec::{InvocationStrategy, ToolSpec};
use std::path::Path;
use std::time::Duration;

/// Minimum Java feature release.
pub const MIN_JAVA_MAJOR: u64 = 21;
/// Minimum Git major version.
pub const MIN_GIT_MAJOR: u64 = 2;
/// Minimum Docker engine major version.
pub const MIN_DOCKER_MAJOR: u64 = 25;

const QUICK_TIMEOUT: Duration = Duration::from_secs(5);
const TOOL_TIMEOUT: Duration = Duration::from_secs(8);
const DAEMON_TIMEOUT: Duration = Duration::from_secs(10);

const GIT_REMEDIATION: &str = "Install Git and make sure its bin directory is on PATH.";
const DOCKER_NOT_READY: &str = "'docker' is installed but the daemon is not responding: \
    start Docker Desktop (or the docker service).";
const DOCKER_WINDOWS_LOCATION: &str =
    r"Default Docker Desktop location: C:\Program Files\Docker\Docker\resources\bin";
const DOCKER_IDE_PATH: &str = "If running from an IDE, add that directory to the run \
    configuration's PATH or restart the IDE so it inherits the system PATH.";
const COMPOSE_REMEDIATION: &str = "Install the Compose plugin (docker compose) or the \
    standalone docker-compose binary.";
const MAVEN_WINDOWS_PATH: &str =
    r"Make sure %MAVEN_HOME%\bin is on PATH, or invoke mvn.cmd directly.";
const M2_HOME_REMEDIATION: &str = "Setting only M2_HOME to the Maven root also works; \
    its bin directory is added to the search path automatically.";

impl ToolKind {
    /// The detection spec for this tool on the current platform.
    ///
    /// # Example
    ///
    /// ```rust
    /// use env_doctor::ToolKind;
    ///
    /// let spec = ToolKind::Docker.spec();
    /// assert_eq!(spec.minimum_major, Some(25));
    /// assert!(spec.readiness.is_some());
    /// ```
    pub fn spec(&self) -> ToolSpec {
        let name = self.display_name();
        match self {
            Self::Java => {
                let remediation = format!(
                    "Install a JDK {MIN_JAVA_MAJOR}+ and put its bin directory on PATH \
                     (or set JAVA_HOME and add JAVA_HOME/bin)."
                );
                let version = InvocationStrategy::direct(["java", "-version"], QUICK_TIMEOUT);
                ToolSpec::new(name)
                    .with_strategy(version)
                    .with_minimum_major(MIN_JAVA_MAJOR)
                    .with_legacy_major()
                    .with_remediation(remediation)
            }

            Self::Git => {
                let version = InvocationStrategy::direct(["git", "--version"], QUICK_TIMEOUT);
                ToolSpec::new(name)
                    .with_strategy(version)
                    .with_minimum_major(MIN_GIT_MAJOR)
                    .with_remediation(GIT_REMEDIATION)
            }

            Self::Maven => maven_spec(name),

            Self::Docker => {
                let version = InvocationStrategy::direct(["docker", "--version"], TOOL_TIMEOUT);
                let spec = ToolSpec::new(name)
                    .with_strategy(version)
                    .with_minimum_major(MIN_DOCKER_MAJOR)
                    .with_readiness(["docker", "info"], DAEMON_TIMEOUT, DOCKER_NOT_READY);
                if cfg!(windows) {
                    spec.with_remediation(DOCKER_WINDOWS_LOCATION)
                        .with_remediation(DOCKER_IDE_PATH)
                } else {
                    spec.with_remediation("Install Docker and make sure 'docker' is on PATH.")
                }
            }

            Self::Compose => {
                let plugin = ["docker", "compose", "version"];
                let standalone = [self.executable_name(), "--version"];
                ToolSpec::new(name)
                    .with_strategy(InvocationStrategy::direct(plugin, TOOL_TIMEOUT))
                    .with_strategy(InvocationStrategy::direct(standalone, TOOL_TIMEOUT))
                    .optional()
                    .with_remediation(COMPOSE_REMEDIATION)
            }
        }
    }
}

fn maven_spec(name: &str) -> ToolSpec {
    let user_settings = Path::new(".m2").join("settings.xml");
    let install_settings = Path::new("conf").join("settings.xml");
    let spec = ToolSpec::new(name)
        .with_install_root_vars(MAVEN_HOME_VARS.iter().copied())
        .with_settings_lookup(user_settings, install_settings);

    let spec = if cfg!(windows) {
        spec.with_strategy(InvocationStrategy::shell(["mvn", "-v"], TOOL_TIMEOUT))
            .with_strategy(InvocationStrategy::shell(["mvn.cmd", "-v"], TOOL_TIMEOUT))
            .with_strategy(install_root_launcher("mvn.cmd", true))
            .with_strategy(install_root_launcher("mvn.bat", true))
            .with_remediation(MAVEN_WINDOWS_PATH)
    } else {
        spec.with_strategy(InvocationStrategy::direct(["mvn", "-v"], TOOL_TIMEOUT))
            .with_strategy(install_root_launcher("mvn", false))
            .with_remediation("Make sure $MAVEN_HOME/bin is on PATH.")
    };

    spec.with_remediation(M2_HOME_REMEDIATION)
}

/// `<install root>/bin/<executable> -v`, the last resort for Maven.
fn install_root_launcher(executable: &str, shell: bool) -> InvocationStrategy {
    InvocationStrategy::install_root(executable, ["-v"], shell, TOOL_TIMEOUT)
}

/// Specs for every [`ToolKind`], in registry order.
pub fn default_registry() -> Vec<ToolSpec> {
    ToolKind::all().map(|kind| kind.spec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool_spec::Invocation;

    #[test]
    fn test_default_registry_order() {
        let names: Vec<_> = default_registry().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Java", "Git", "Maven", "Docker", "Compose"]);
    }

    #[test]
    fn test_policies() {
        let java = ToolKind::Java.spec();
        assert_eq!(java.minimum_major, Some(21));
        assert!(java.legacy_major);

        assert_eq!(ToolKind::Git.spec().minimum_major, Some(2));
        assert_eq!(ToolKind::Maven.spec().minimum_major, None);
    }

    #[test]
    fn test_only_compose_is_optional() {
        for spec in default_registry() {
            assert_eq!(spec.mandatory, spec.name != "Compose", "{}", spec.name);
        }
    }

    #[test]
    fn test_maven_install_root_fallback_is_last() {
        let spec = ToolKind::Maven.spec();
        assert_eq!(spec.install_root_vars, MAVEN_HOME_VARS);
        let last = &spec.strategies.last().unwrap().invocation;
        assert!(matches!(last, Invocation::InstallRoot { .. }));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_maven_runs_mvn_directly() {
        let spec = ToolKind::Maven.spec();
        let expected = Invocation::Direct(vec!["mvn".into(), "-v".into()]);
        assert_eq!(spec.strategies[0].invocation, expected);
    }

    #[cfg(windows)]
    #[test]
    fn test_maven_runs_through_shell_on_windows() {
        let spec = ToolKind::Maven.spec();
        let first = &spec.strategies[0].invocation;
        assert!(matches!(first, Invocation::Shell(_)));
    }

    #[test]
    fn test_maven_settings_lookup() {
        let lookup = ToolKind::Maven.spec().settings.unwrap();
        let user_path = Path::new(".m2").join("settings.xml");
        assert_eq!(lookup.user_path, user_path);
        let install_path = Path::new("conf").join("settings.xml");
        assert_eq!(lookup.install_path, install_path);
        assert!(ToolKind::Git.spec().settings.is_none());
    }

    #[test]
    fn test_compose_tries_plugin_first() {
        let spec = ToolKind::Compose.spec();
        assert_eq!(spec.strategies.len(), 2);
        assert_eq!(
            spec.strategies[0].invocation,
            Invocation::Direct(vec!["docker".into(), "compose".into(), "version".into()])
        );
    }

    #[test]
    fn test_docker_readiness() {
        let check = ToolKind::Docker.spec().readiness.unwrap();
        assert_eq!(check.argv, vec!["docker".to_string(), "info".to_string()]);
        assert_eq!(check.timeout, DAEMON_TIMEOUT);
    }
}
