//! loopback-bench - how many looping sources can OpenAL Soft keep up with?
//!
//! Run with: cargo run --release

use std::{io, process::ExitCode};

use loopback_bench::{backend::OpenAl, report_failure, run_and_report, BenchConfig, BenchError};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;

    // Logs go to stderr so they never interleave with the results on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = BenchConfig::default();
    let mut stdout = io::stdout().lock();

    let status = match OpenAl::load() {
        Ok(mut backend) => run_and_report(&mut backend, &config, &mut stdout)?,
        Err(err) => {
            error!(%err, "OpenAL is not available");
            report_failure(&BenchError::DeviceUnavailable, &mut stdout)?
        }
    };
    Ok(ExitCode::from(status))
}
