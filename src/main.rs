//! env-doctor CLI entry point.
//!
//! Runs the default registry once and exits 0 when every mandatory tool
//! passes, 1 otherwise. All output goes to stdout.

use std::process::ExitCode;

use clap::Parser;
use env_doctor::{default_registry, run_all, DoctorConfig, EnvSnapshot, ProcessRunner, ToolDetector};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Check that the project's required toolchains are installed and new enough.
#[derive(Debug, Parser)]
#[command(name = "env-doctor", version, about)]
struct Cli {}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise verbose mode enables the
/// per-command trace at debug level.
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "env_doctor=debug"
    } else {
        "env_doctor=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stdout))
        .with(filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _cli = Cli::parse();

    let env = EnvSnapshot::capture();
    let (config, config_error) = match DoctorConfig::from_env(&env) {
        Ok(config) => (config, None),
        Err(e) => (DoctorConfig::default(), Some(e)),
    };
    init_tracing(config.verbose);
    if let Some(e) = config_error {
        tracing::warn!("{}; using defaults", e);
    }

    println!("==================================================");
    let version = env!("CARGO_PKG_VERSION");
    println!("env-doctor {version} - environment check");
    println!("==================================================");

    let runner = ProcessRunner::new(&env).with_grace_period(config.grace_period);
    let detector = ToolDetector::new(runner, env).with_timeout_override(config.timeout_override);
    let report = run_all(&detector, &default_registry()).await;

    println!();
    print!("{}", report.render_summary());

    ExitCode::from(report.exit_code())
}
