//! Request executor: build one transfer, judge its outcome, and decide
//! whether to retry.
//!
//! The executor does not own a loop. The batch orchestrator drives every
//! transfer on the session's multi handle and calls back into
//! [`complete`] and [`resolve_error`] as transfers finish. This keeps the
//! server-error counter single-writer: only the driving thread touches
//! [`BatchState`].

mod handler;
mod request;
mod result;

use curl::easy::{Easy2, List};
use serde_json::Value;
use std::time::Duration;

use crate::batch::{self, BatchState};
use crate::error::FetchError;
use crate::progress::ProgressSink;
use crate::retry::{classify, ErrorKind, RequestError, RetryDecision, RetryPolicy};
use crate::session::Session;

pub use handler::ResponseHandler;
pub use request::{Method, RequestSpec};
pub use result::{Failure, FetchResult};

/// Server errors tolerated per batch before requests stop retrying them.
pub const DEFAULT_SERVER_ERROR_THRESHOLD: u32 = 3;

/// Retry policy plus the batch-wide circuit-break threshold.
#[derive(Debug, Clone, Copy)]
pub struct FetchPolicy {
    pub retry: RetryPolicy,
    /// Once the batch has seen more server response errors than this, a
    /// failing request is resolved instead of retried.
    pub server_error_threshold: u32,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            server_error_threshold: DEFAULT_SERVER_ERROR_THRESHOLD,
        }
    }
}

/// What to do with a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    Retry(Duration),
    Fail(Failure),
}

/// Run a single request on `session` with the full retry and circuit-break
/// behaviour, accounting into the caller's `state`.
///
/// The request is treated as a batch of one, so the returned result always
/// has index 0.
pub fn execute(
    session: &Session,
    spec: RequestSpec,
    policy: &FetchPolicy,
    state: &mut BatchState,
    progress: Option<&dyn ProgressSink>,
) -> Result<FetchResult, FetchError> {
    batch::run_one(session, &spec, policy, state, progress)
}

/// Build the transfer for `spec` with the session's identity and options applied.
pub(crate) fn prepare(session: &Session, spec: &RequestSpec) -> Result<Easy2<ResponseHandler>, curl::Error> {
    let mut easy = Easy2::new(ResponseHandler::default());
    easy.url(spec.url())?;
    session.configure(&mut easy)?;

    let mut headers = List::new();
    headers.append("Accept: application/json")?;
    match spec.method() {
        Method::Get => easy.get(true)?,
        Method::Post => {
            easy.post(true)?;
            easy.post_fields_copy(&spec.body_bytes())?;
            headers.append("Content-Type: application/json")?;
        }
    }
    easy.http_headers(headers)?;
    Ok(easy)
}

/// Turn a finished transfer into a decoded body or a classified error.
pub(crate) fn complete(
    perform: Result<(), curl::Error>,
    code: u32,
    handler: &ResponseHandler,
) -> Result<Value, RequestError> {
    perform?;
    if !(200..300).contains(&code) {
        return Err(RequestError::Http(code));
    }
    if handler.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&handler.body).map_err(RequestError::Decode)
}

/// Account for a failed attempt in `state` and decide between retrying and
/// resolving the slot.
pub(crate) fn resolve_error(
    err: &RequestError,
    attempt: u32,
    policy: &FetchPolicy,
    state: &mut BatchState,
    url: &str,
) -> Resolution {
    let kind = classify(err);
    match kind {
        ErrorKind::Timeout => {
            state.timeout_errors += 1;
            tracing::warn!(url, attempt, "request timed out; not retrying");
            return Resolution::Fail(Failure::Timeout);
        }
        ErrorKind::ServerResponse(_) => {
            state.server_response_errors += 1;
            if state.server_response_errors > policy.server_error_threshold {
                state.escalations += 1;
                tracing::error!(
                    url,
                    error = %err,
                    server_errors = state.server_response_errors,
                    threshold = policy.server_error_threshold,
                    "too many server response errors in this batch; not retrying"
                );
                return Resolution::Fail(failure_for(err));
            }
        }
        _ => {}
    }

    match policy.retry.decide(attempt, kind) {
        RetryDecision::RetryAfter(delay) => {
            state.retries += 1;
            tracing::debug!(url, attempt, error = %err, delay_ms = delay.as_millis() as u64, "retrying request");
            Resolution::Retry(delay)
        }
        RetryDecision::Exhausted => {
            tracing::warn!(url, attempts = attempt, error = %err, "retries exhausted");
            Resolution::Fail(Failure::RetryExhausted {
                attempts: attempt,
                last_error: err.to_string(),
            })
        }
        RetryDecision::NoRetry => {
            tracing::debug!(url, attempt, error = %err, "request failed");
            Resolution::Fail(failure_for(err))
        }
    }
}

fn failure_for(err: &RequestError) -> Failure {
    match err {
        RequestError::Http(status) => Failure::ServerResponse { status: *status },
        RequestError::Curl(_) | RequestError::Decode(_) => Failure::Transport {
            message: err.to_string(),
        },
    }
}
