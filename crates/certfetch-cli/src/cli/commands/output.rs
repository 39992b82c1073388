//! Terminal output: progress bar on stderr, JSON results on stdout.

use anyhow::Result;
use certfetch_core::{BatchReport, ProgressSink};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

/// Progress bar fed by the batch engine. Draws to stderr.
pub struct BarSink {
    bar: ProgressBar,
}

impl BarSink {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} ok ({elapsed})")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for BarSink {
    fn set_total(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    fn advance(&self) {
        self.bar.inc(1);
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_durations(durations: &[String]) {
    for d in durations {
        eprintln!("{}", d);
    }
}

/// Results to stdout; counters and durations to stderr.
pub fn print_report(report: &BatchReport, durations: &[String]) -> Result<()> {
    print_json(&report.results)?;
    eprintln!(
        "{} ok, {} failed; server errors {}, timeouts {}, retries {}{}",
        report.successes(),
        report.failures(),
        report.state.server_response_errors,
        report.state.timeout_errors,
        report.state.retries,
        if report.state.is_escalated() {
            " (server error threshold reached)"
        } else {
            ""
        }
    );
    print_durations(durations);
    Ok(())
}
