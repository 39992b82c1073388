//! Human-readable log of batch durations, owned by the caller.

use std::time::Duration;

/// Durations of every batch recorded so far, e.g. `"finished in 1.23 seconds"`.
#[derive(Debug, Clone, Default)]
pub struct DurationLog {
    entries: Vec<String>,
}

impl DurationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry and return it.
    pub fn record(&mut self, elapsed: Duration) -> &str {
        self.entries.push(format_duration(elapsed));
        self.entries.last().map(String::as_str).unwrap_or_default()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn format_duration(elapsed: Duration) -> String {
    format!("finished in {:.2} seconds", elapsed.as_secs_f64())
}
