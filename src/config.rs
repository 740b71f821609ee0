//! Runtime configuration.
//!
//! [`DoctorConfig`] controls diagnostics verbosity and the bounds applied to
//! every spawned command. Values come from environment variables so that a
//! bare invocation needs no flags.

use crate::detection::DEFAULT_GRACE_PERIOD;
use crate::env::EnvSnapshot;
use std::time::Duration;
use thiserror::Error;

/// Enables or disables the per-command trace (`1`/`0`, `true`/`false`, `yes`/`no`).
pub const VERBOSE_VAR: &str = "ENV_DOCTOR_VERBOSE";
/// Grace period for output readers after exit, in milliseconds.
pub const GRACE_MS_VAR: &str = "ENV_DOCTOR_GRACE_MS";
/// Replaces every per-strategy timeout, in seconds.
pub const TIMEOUT_SECS_VAR: &str = "ENV_DOCTOR_TIMEOUT_SECS";

/// A configuration variable held a value that could not be used.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: &'static str,
}

/// Configuration for a diagnostic run.
///
/// # Example
///
/// ```rust
/// use env_doctor::{DoctorConfig, EnvSnapshot};
/// use std::time::Duration;
///
/// let env = EnvSnapshot::from_pairs([
///     ("ENV_DOCTOR_VERBOSE", "no"),
///     ("ENV_DOCTOR_TIMEOUT_SECS", "3"),
/// ]);
/// let config = DoctorConfig::from_env(&env).unwrap();
/// assert!(!config.verbose);
/// assert_eq!(config.timeout_override, Some(Duration::from_secs(3)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DoctorConfig {
    /// Trace each command line and its captured output.
    ///
    /// Default: `true`
    pub verbose: bool,

    /// How long to wait for stdout/stderr readers once a process exits.
    ///
    /// Default: 200 milliseconds
    pub grace_period: Duration,

    /// Timeout applied to every attempt instead of the per-strategy values.
    ///
    /// Default: `None`
    pub timeout_override: Option<Duration>,
}

impl Default for DoctorConfig {
    fn default() -> Self {
        Self {
            verbose: true,
            grace_period: DEFAULT_GRACE_PERIOD,
            timeout_override: None,
        }
    }
}

impl DoctorConfig {
    /// Read configuration from `env`, starting from the defaults.
    pub fn from_env(env: &EnvSnapshot) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = non_blank(env, VERBOSE_VAR) {
            config.verbose = parse_flag(VERBOSE_VAR, value)?;
        }
        if let Some(value) = non_blank(env, GRACE_MS_VAR) {
            config.grace_period = Duration::from_millis(parse_number(GRACE_MS_VAR, value)?);
        }
        if let Some(value) = non_blank(env, TIMEOUT_SECS_VAR) {
            let secs = parse_number(TIMEOUT_SECS_VAR, value)?;
            if secs == 0 {
                return Err(ConfigError {
                    var: TIMEOUT_SECS_VAR,
                    value: value.to_string(),
                    reason: "must be greater than zero",
                });
            }
            config.timeout_override = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

fn non_blank<'a>(env: &'a EnvSnapshot, var: &str) -> Option<&'a str> {
    env.get(var).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError {
            var,
            value: value.to_string(),
            reason: "expected a boolean",
        }),
    }
}

fn parse_number(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError {
        var,
        value: value.to_string(),
        reason: "expected a non-negative integer",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DoctorConfig::default();
        assert!(config.verbose);
        assert_eq!(config.grace_period, Duration::from_millis(200));
        assert_eq!(config.timeout_override, None);
    }

    #[test]
    fn test_from_empty_env_is_default() {
        let config = DoctorConfig::from_env(&EnvSnapshot::default()).unwrap();
        assert_eq!(config, DoctorConfig::default());
    }

    #[test]
    fn test_from_env_overrides() {
        let env = EnvSnapshot::from_pairs([
            (VERBOSE_VAR, "OFF"),
            (GRACE_MS_VAR, " 500 "),
            (TIMEOUT_SECS_VAR, "12"),
        ]);
        let config = DoctorConfig::from_env(&env).unwrap();
        assert!(!config.verbose);
        assert_eq!(config.grace_period, Duration::from_millis(500));
        assert_eq!(config.timeout_override, Some(Duration::from_secs(12)));
    }

    #[test]
    fn test_blank_values_ignored() {
        let env = EnvSnapshot::from_pairs([(VERBOSE_VAR, "  "), (GRACE_MS_VAR, "")]);
        let config = DoctorConfig::from_env(&env).unwrap();
        assert_eq!(config, DoctorConfig::default());
    }

    #[test]
    fn test_invalid_flag() {
        let env = EnvSnapshot::from_pairs([(VERBOSE_VAR, "maybe")]);
        let err = DoctorConfig::from_env(&env).unwrap_err();
        assert_eq!(err.var, VERBOSE_VAR);
        assert_eq!(
            err.to_string(),
            "invalid value \"maybe\" for ENV_DOCTOR_VERBOSE: expected a boolean"
        );
    }

    #[test]
    fn test_invalid_numbers() {
        let env = EnvSnapshot::from_pairs([(GRACE_MS_VAR, "-5")]);
        assert_eq!(DoctorConfig::from_env(&env).unwrap_err().var, GRACE_MS_VAR);

        let env = EnvSnapshot::from_pairs([(TIMEOUT_SECS_VAR, "0")]);
        let err = DoctorConfig::from_env(&env).unwrap_err();
        assert_eq!(err.reason, "must be greater than zero");
    }
}
