//! Entry-point plumbing for the `fitbit_fetch` binary: log filter setup and
//! the fixed heart-rate then sleep fetch sequence.

use anyhow::Context;
use fitbit_client::{DateParam, FetchedRecord, FitbitClient, Period};
use std::io::Write;

/// Per-target overrides that keep HTTP internals quiet by default.
const QUIET_TARGETS: &str = "hyper=warn,hyper_util=warn,reqwest=warn";

/// Log level from `FITBIT_LOG_LEVEL`, then `RUST_LOG`, then `info`.
pub fn log_level_with<F>(mut get: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    get("FITBIT_LOG_LEVEL")
        .or_else(|| get("RUST_LOG"))
        .unwrap_or_else(|| "info".to_string())
}

pub fn env_filter(log_env: &str) -> tracing_subscriber::EnvFilter {
    let combined = format!("{log_env},{QUIET_TARGETS}");
    tracing_subscriber::EnvFilter::try_new(combined)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("info,{QUIET_TARGETS}")))
}

pub fn init_tracing(log_env: &str) {
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter(log_env))
        .init();
}

/// Fetch heart rate, then sleep, printing each body as pretty JSON to `out`.
///
/// A failure in the first fetch stops the run before the second.
pub async fn run<C, W>(
    client: &mut C,
    date: DateParam,
    period: Period,
    out: &mut W,
) -> anyhow::Result<Vec<FetchedRecord>>
where
    C: FitbitClient + ?Sized,
    W: Write,
{
    let heart = client
        .heart_rate(date, period)
        .await
        .with_context(|| format!("fetching heart rate for {date}/{period}"))?;
    print_record(&heart, out)?;

    let sleep = client.sleep().await.context("fetching sleep log")?;
    print_record(&sleep, out)?;

    Ok(vec![heart, sleep])
}

fn print_record<W: Write>(record: &FetchedRecord, out: &mut W) -> anyhow::Result<()> {
    let data = record.response.json()?;
    writeln!(out, "{}", serde_json::to_string_pretty(&data)?)?;
    tracing::info!(path = %record.path.display(), "fetched");
    Ok(())
}
