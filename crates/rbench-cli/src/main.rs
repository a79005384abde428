//! `rbench` command-line entry point.
//!
//! Loads a benchmark configuration, runs one benchmark pass against the
//! configured endpoints and prints a per-endpoint summary. Ctrl-C cancels the
//! run; requests already in flight finish and the partial report is still
//! printed.

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rbench_core::config::{read_config, validate_config};
use rbench_core::engine::{run_benchmark, EndpointStats, Providers};
use rbench_core::results::{BenchmarkReport, Record};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{render_table, Args};

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG overrides the default level. Logs go to stderr so the summary
    // table on stdout stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = read_config(&args.config)
        .await
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    args.apply(&mut config);

    let errors = validate_config(&config);
    if !errors.is_empty() {
        for error in &errors {
            tracing::error!("{error}");
        }
        bail!("configuration has {} error(s)", errors.len());
    }

    let providers = Providers::from_config(&config)?;
    if config.telemetry.is_some() && providers.telemetry.is_none() {
        warn!("Telemetry configured without an API key; correlation disabled");
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling remaining requests");
            ctrl_c.cancel();
        }
    });

    let report = run_benchmark(&config, &providers, cancel).await?;

    print_summary(&report, config.sla.as_ref());
    if args.records {
        let rows: Vec<Vec<String>> = report.records.iter().map(Record::to_row).collect();
        println!();
        print!("{}", render_table(&Record::COLUMNS, &rows));
    }

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}

fn print_summary(report: &BenchmarkReport, sla: Option<&rbench_core::config::SlaSettings>) {
    let mut columns: Vec<&str> = EndpointStats::COLUMNS.to_vec();
    if sla.is_some() {
        columns.push("sla");
    }

    let rows: Vec<Vec<String>> = report
        .stats
        .iter()
        .map(|stats| {
            let mut row = stats.to_row();
            if let Some(sla) = sla {
                let mark = if stats.meets_sla(sla) { "ok" } else { "FAIL" };
                row.push(mark.to_string());
            }
            row
        })
        .collect();

    print!("{}", render_table(&columns, &rows));

    if let Some(summary) = &report.correlation {
        println!(
            "\ncorrelated {}/{} requests after {} poll(s) ({:?})",
            summary.matched, summary.total, summary.attempts, summary.stop_reason
        );
    }
}
