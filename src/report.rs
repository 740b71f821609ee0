//! Running the whole registry and turning outcomes into a verdict.

use crate::detect::ToolDetector;
use crate::detection::CommandRunner;
use crate::outcome::{CommandResult, DetectionOutcome, FailureReason};
use crate::tool_spec::ToolSpec;
use futures::FutureExt;
use std::any::Any;
use std::fmt::Write as _;
use std::panic::AssertUnwindSafe;
use tracing::error;

/// Process exit status when every mandatory tool passed.
pub const EXIT_PASS: u8 = 0;
/// Process exit status when any mandatory tool failed.
pub const EXIT_FAIL: u8 = 1;

/// Remediation advice for one failing tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub tool: String,
    pub lines: Vec<String>,
}

/// Outcomes for a full registry run, in registry order.
#[derive(Debug, Clone)]
pub struct Report {
    specs: Vec<ToolSpec>,
    outcomes: Vec<DetectionOutcome>,
}

/// Detect every tool in `registry`, one after the other.
///
/// A fault while detecting one tool is recorded as a failed outcome for that
/// tool and the run continues with the next.
///
/// # Arguments
///
/// * `detector` - Detector used for every tool
/// * `registry` - Tools to check, in report order
///
/// # Returns
///
/// A [`Report`] holding one outcome per spec, in the order given.
///
/// # Example
///
/// ```rust,no_run
/// use env_doctor::{default_registry, run_all, EnvSnapshot, ProcessRunner, ToolDetector};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let env = EnvSnapshot::capture();
///     let detector = ToolDetector::new(ProcessRunner::new(&env), env);
///     let report = run_all(&detector, &default_registry()).await;
///     std::process::exit(report.exit_code().into());
/// }
/// ```
pub async fn run_all<R: CommandRunner>(
    detector: &ToolDetector<R>,
    registry: &[ToolSpec],
) -> Report {
    let mut outcomes = Vec::with_capacity(registry.len());
    for spec in registry {
        let guarded = AssertUnwindSafe(detector.detect(spec));
        let outcome = match guarded.catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(tool = %spec.name, "detection faulted: {}", message);
                internal_failure(spec, message)
            }
        };
        outcomes.push(outcome);
    }

    Report {
        specs: registry.to_vec(),
        outcomes,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn internal_failure(spec: &ToolSpec, message: String) -> DetectionOutcome {
    let argv = vec![spec.name.clone()];
    DetectionOutcome {
        tool: spec.name.clone(),
        result: CommandResult::failed(argv, FailureReason::Internal, message),
        version: None,
        major: None,
        minimum_major: spec.minimum_major,
        policy_passed: false,
        ready: None,
        mandatory: spec.mandatory,
        location: None,
        install_root: None,
        settings_file: None,
    }
}

impl Report {
    pub fn outcomes(&self) -> &[DetectionOutcome] {
        &self.outcomes
    }

    /// Outcome for the tool with the given name.
    pub fn outcome(&self, tool: &str) -> Option<&DetectionOutcome> {
        self.outcomes.iter().find(|o| o.tool == tool)
    }

    /// True when every mandatory tool passed.
    pub fn overall_passed(&self) -> bool {
        self.outcomes
            .iter()
            .filter(|o| o.mandatory)
            .all(DetectionOutcome::passed)
    }

    /// [`EXIT_PASS`] or [`EXIT_FAIL`].
    pub fn exit_code(&self) -> u8 {
        if self.overall_passed() {
            EXIT_PASS
        } else {
            EXIT_FAIL
        }
    }

    /// Advice for every tool that did not pass, mandatory or not.
    pub fn hints(&self) -> Vec<Hint> {
        self.specs
            .iter()
            .zip(&self.outcomes)
            .filter_map(|(spec, outcome)| hint_for(spec, outcome))
            .collect()
    }

    /// Plain-text summary: one block per tool, then hints and the verdict.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "----------------- SUMMARY -----------------");
        for (spec, outcome) in self.specs.iter().zip(&self.outcomes) {
            render_outcome(&mut out, spec, outcome);
        }
        let _ = writeln!(out, "-------------------------------------------");

        let hints = self.hints();
        if !hints.is_empty() {
            let _ = writeln!(out, "\nHints:");
            for hint in &hints {
                for (i, line) in hint.lines.iter().enumerate() {
                    let bullet = if i == 0 { "-" } else { "  *" };
                    let _ = writeln!(out, "{bullet} {line}");
                }
            }
        }

        let verdict = if self.overall_passed() {
            "PASS"
        } else {
            "FAIL"
        };
        let _ = writeln!(out, "\nOverall: {verdict}");
        out
    }
}

fn hint_for(spec: &ToolSpec, outcome: &DetectionOutcome) -> Option<Hint> {
    if outcome.passed() {
        return None;
    }

    let mut lines = Vec::new();
    if !outcome.is_present() {
        let result = &outcome.result;
        let headline = match result.failure_reason() {
            Some(FailureReason::Timeout) => format!(
                "{}: `{}` did not finish in time; the tool may be hanging or waiting for input.",
                spec.name,
                result.display_command()
            ),
            Some(FailureReason::Internal) => format!(
                "{}: detection failed unexpectedly ({}).",
                spec.name,
                result.stderr()
            ),
            Some(FailureReason::IoError) => format!(
                "{}: `{}` could not be run ({}); check file permissions.",
                spec.name,
                result.display_command(),
                result.stderr().trim()
            ),
            _ => format!(
                "{} was not detected (last tried `{}`).",
                spec.name,
                result.display_command()
            ),
        };
        lines.push(headline);
        lines.extend(spec.remediation.iter().cloned());
    } else if !outcome.policy_passed {
        let found = outcome
            .version
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "unknown version".to_string());
        let minimum = outcome.minimum_major.unwrap_or(0);
        lines.push(format!(
            "{} {} is too old; upgrade to major version {}+.",
            spec.name, found, minimum
        ));
    } else if outcome.ready == Some(false) {
        let hint = spec
            .readiness
            .as_ref()
            .map(|check| check.hint.clone())
            .unwrap_or_else(|| format!("{} is installed but not ready.", spec.name));
        lines.push(hint);
    }

    Some(Hint {
        tool: spec.name.clone(),
        lines,
    })
}

fn render_outcome(out: &mut String, spec: &ToolSpec, outcome: &DetectionOutcome) {
    let label = format!("[{}]", outcome.tool);
    let version = outcome
        .version
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "(unknown)".to_string());
    let passed = outcome.passed();
    let verdict = if passed { "[OK]" } else { "[NOT OK]" };

    let present = outcome.is_present();
    let _ = write!(out, "{label:<10} present={present}, version={version}");
    if let Some(major) = outcome.major {
        let _ = write!(out, " (major={major})");
    }
    let _ = write!(out, "  {verdict}");
    if let Some(minimum) = outcome.minimum_major {
        let _ = write!(out, " (>= {minimum})");
    }
    if !outcome.mandatory {
        let _ = write!(out, " (optional)");
    }
    let _ = writeln!(out);

    if let Some(ready) = outcome.ready {
        let _ = writeln!(out, "{:<10} ready={ready}", "");
    }
    if let Some(location) = &outcome.location {
        let _ = writeln!(out, "{:<10} location={}", "", location.display());
    }
    if let Some(root) = &outcome.install_root {
        let _ = writeln!(out, "{:<10} env={}={}", "", root.var, root.path.display());
    }
    if let Some(lookup) = &spec.settings {
        let found = match &outcome.settings_file {
            Some(path) => path.display().to_string(),
            None => "(not found)".to_string(),
        };
        let _ = writeln!(out, "{:<10} {}={found}", "", lookup.label());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{EnvSnapshot, HOME_VARS};
    use crate::tool_spec::InvocationStrategy;
    use async_trait::async_trait;
    use std::time::Duration;

    /// Answers by program name; panics for `boom`.
    struct TableRunner;

    #[async_trait]
    impl CommandRunner for TableRunner {
        async fn run(&self, argv: &[String], _timeout: Duration) -> CommandResult {
            let output = match argv[0].as_str() {
                "good" => "good 3.2.1",
                "old" => "old 1.0.0",
                "boom" => panic!("reader task could not be created"),
                "slow" => return CommandResult::timed_out(argv.to_vec()),
                "daemon" => {
                    let stderr = "not running".to_string();
                    return CommandResult::from_exit(argv.to_vec(), 1, String::new(), stderr);
                }
                _ => {
                    let error = std::io::Error::from(std::io::ErrorKind::NotFound);
                    return CommandResult::spawn_failure(argv.to_vec(), &error);
                }
            };
            CommandResult::from_exit(argv.to_vec(), 0, output.to_string(), String::new())
        }
    }

    fn tool(name: &str, program: &str) -> ToolSpec {
        let strategy = InvocationStrategy::direct([program], Duration::from_secs(1));
        ToolSpec::new(name).with_strategy(strategy)
    }

    async fn run(registry: &[ToolSpec]) -> Report {
        let detector = ToolDetector::new(TableRunner, EnvSnapshot::default());
        run_all(&detector, registry).await
    }

    #[tokio::test]
    async fn test_all_pass() {
        let report = run(&[tool("A", "good").with_minimum_major(3)]).await;
        assert!(report.overall_passed());
        assert_eq!(report.exit_code(), EXIT_PASS);
        assert!(report.hints().is_empty());
        assert!(report.render_summary().contains("Overall: PASS"));
    }

    #[tokio::test]
    async fn test_missing_mandatory_fails() {
        let report = run(&[
            tool("A", "good"),
            tool("B", "nope").with_remediation("install B"),
        ])
        .await;
        assert!(!report.overall_passed());
        assert_eq!(report.exit_code(), EXIT_FAIL);

        let hints = report.hints();
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].tool, "B");
        assert!(hints[0].lines[0].contains("was not detected"));
        assert_eq!(hints[0].lines[1], "install B");
    }

    #[tokio::test]
    async fn test_optional_tool_does_not_affect_verdict() {
        let report = run(&[tool("A", "good"), tool("C", "nope").optional()]).await;
        assert!(report.overall_passed());
        // Still hinted, just not fatal.
        assert_eq!(report.hints().len(), 1);
        assert!(report.render_summary().contains("(optional)"));
    }

    #[tokio::test]
    async fn test_version_too_low_hint() {
        let report = run(&[tool("Old", "old").with_minimum_major(2)]).await;
        assert!(!report.overall_passed());
        let hints = report.hints();
        let expected = "Old 1.0.0 is too old; upgrade to major version 2+.";
        assert_eq!(hints[0].lines, [expected]);
    }

    #[tokio::test]
    async fn test_not_ready_hint() {
        let secs = Duration::from_secs(1);
        let spec = tool("Engine", "good").with_readiness(["daemon"], secs, "start the engine");
        let report = run(&[spec]).await;
        let outcome = report.outcome("Engine").unwrap();
        assert!(outcome.policy_passed);
        assert_eq!(outcome.ready, Some(false));
        assert!(!report.overall_passed());
        assert_eq!(report.hints()[0].lines, ["start the engine"]);
    }

    #[tokio::test]
    async fn test_timeout_hint() {
        let report = run(&[tool("Slow", "slow")]).await;
        let hints = report.hints();
        assert!(hints[0].lines[0].contains("did not finish in time"));
    }

    #[tokio::test]
    async fn test_panic_becomes_failed_outcome() {
        let report = run(&[tool("Boom", "boom"), tool("A", "good")]).await;

        assert_eq!(report.outcomes().len(), 2);
        let boom = report.outcome("Boom").unwrap();
        assert!(!boom.is_present());
        assert_eq!(boom.result.failure_reason(), Some(FailureReason::Internal));
        assert!(boom.result.stderr().contains("reader task"));
        assert!(report.outcome("A").unwrap().passed());
        assert!(!report.overall_passed());
    }

    #[tokio::test]
    async fn test_summary_lines() {
        let report = run(&[tool("Git", "good").with_minimum_major(2)]).await;
        let summary = report.render_summary();
        let line = "[Git]      present=true, version=3.2.1 (major=3)  [OK] (>= 2)";
        assert!(summary.contains(line));
    }

    #[tokio::test]
    async fn test_summary_settings_line() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(home.path().join("s.xml"), "<settings/>").unwrap();
        let home_dir = home.path().to_string_lossy().into_owned();
        let env = EnvSnapshot::from_pairs([(HOME_VARS[0], home_dir)]);
        let detector = ToolDetector::new(TableRunner, env);

        let found = tool("A", "good").with_settings_lookup("s.xml", "conf/s.xml");
        let missing = tool("B", "good").with_settings_lookup("none.xml", "conf/none.xml");
        let plain = tool("C", "good");
        let report = run_all(&detector, &[found, missing, plain]).await;
        let summary = report.render_summary();

        let expected = format!("s.xml={}", home.path().join("s.xml").display());
        assert!(summary.contains(&expected));
        assert!(summary.contains("none.xml=(not found)"));
        assert_eq!(summary.matches(".xml=").count(), 2);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(boxed.as_ref()), "static message");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
