//! Batch orchestrator.
//!
//! Fans a list of [`RequestSpec`]s out over one [`Session`], waits for every
//! one of them, and returns results in input order together with the batch's
//! error accounting. Per-request failures never abort the batch; each slot is
//! resolved to a success or an explicit [`Failure`](crate::executor::Failure).

mod durations;
pub mod fallback;
mod run;
mod state;

use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::error::FetchError;
use crate::executor::{FetchPolicy, FetchResult, RequestSpec};
use crate::progress::ProgressSink;
use crate::session::Session;

pub use durations::{format_duration, DurationLog};
pub use state::BatchState;

/// Outcome of one batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// One entry per input request, in input order.
    pub results: Vec<FetchResult>,
    pub state: BatchState,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn successes(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failures(&self) -> usize {
        self.results.len() - self.successes()
    }
}

/// One GET per URL.
pub fn get_requests<S: AsRef<str>>(urls: &[S]) -> Vec<RequestSpec> {
    urls.iter().map(|u| RequestSpec::get(u.as_ref())).collect()
}

/// One POST per payload, all against `url`.
pub fn post_requests(url: &str, bodies: Vec<Value>) -> Vec<RequestSpec> {
    bodies
        .into_iter()
        .map(|body| RequestSpec::post(url, body))
        .collect()
}

/// Run every spec concurrently on `session` and wait for all of them.
///
/// Only a failure of the transfer engine itself returns `Err`.
pub fn run_batch(
    session: &Session,
    specs: Vec<RequestSpec>,
    policy: &FetchPolicy,
    progress: Option<&dyn ProgressSink>,
) -> Result<BatchReport, FetchError> {
    let start = Instant::now();
    let mut state = BatchState::default();
    if let Some(p) = progress {
        p.set_total(specs.len());
    }

    let results = run::run_multi(session, &specs, policy, &mut state, progress)?;

    let report = BatchReport {
        results,
        state,
        elapsed: start.elapsed(),
    };
    tracing::info!(
        requests = report.results.len(),
        ok = report.successes(),
        failed = report.failures(),
        server_errors = state.server_response_errors,
        timeouts = state.timeout_errors,
        escalations = state.escalations,
        "{}",
        format_duration(report.elapsed)
    );
    Ok(report)
}

/// Drive one request to resolution, accounting into `state`.
pub(crate) fn run_one(
    session: &Session,
    spec: &RequestSpec,
    policy: &FetchPolicy,
    state: &mut BatchState,
    progress: Option<&dyn ProgressSink>,
) -> Result<FetchResult, FetchError> {
    let mut results = run::run_multi(session, std::slice::from_ref(spec), policy, state, progress)?;
    Ok(results.swap_remove(0))
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}
