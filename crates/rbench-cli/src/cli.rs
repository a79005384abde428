use std::path::PathBuf;

use clap::Parser;
use rbench_core::config::BenchConfig;

/// Benchmark HTTP endpoints and correlate results with server telemetry.
#[derive(Debug, Parser)]
#[command(name = "rbench", version, about)]
pub struct Args {
    /// Path to the benchmark configuration (JSON).
    pub config: PathBuf,

    /// Write the full JSON report to this file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override the configured iteration count.
    #[arg(short = 'n', long)]
    pub iterations: Option<u32>,

    /// Override the concurrency bound. Omit for unbounded.
    #[arg(short = 'p', long)]
    pub max_parallel: Option<usize>,

    /// Only read response headers; skip downloading bodies.
    #[arg(long)]
    pub headers_only: bool,

    /// Skip telemetry correlation even when configured.
    #[arg(long)]
    pub no_telemetry: bool,

    /// Print one line per request after the summary table.
    #[arg(long)]
    pub records: bool,
}

impl Args {
    /// Fold command-line overrides into a loaded configuration.
    pub fn apply(&self, config: &mut BenchConfig) {
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if self.max_parallel.is_some() {
            config.max_parallel = self.max_parallel;
        }
        if self.headers_only {
            config.read_headers_only = true;
        }
        if self.no_telemetry {
            config.telemetry = None;
        }
    }
}

/// Render rows as a left-aligned, space-padded text table.
pub fn render_table(columns: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = format_line(columns.iter().copied(), &widths);
    out.push('\n');
    for row in rows {
        out.push_str(&format_line(row.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    out
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
