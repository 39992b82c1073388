//! Curl multi event loop: perform, wait, messages; resolve finished transfers
//! and re-dispatch retries once their backoff has elapsed.
//!
//! Every transfer of the batch is an Easy2 handle on the session's one multi
//! handle, driven from the calling thread. libcurl queues transfers beyond
//! the session's total-connection cap, so everything is added up front.

use std::time::{Duration, Instant};

use curl::easy::Easy2;
use curl::multi::Easy2Handle;

use crate::error::FetchError;
use crate::executor::{self, Failure, FetchPolicy, FetchResult, RequestSpec, Resolution, ResponseHandler};
use crate::progress::ProgressSink;
use crate::session::Session;

use super::BatchState;

/// Upper bound on one `multi.wait`, so due retries are picked up promptly.
const MAX_WAIT: Duration = Duration::from_millis(100);

/// In-flight transfer: handle + input index + 1-based attempt.
type Active = (Easy2Handle<ResponseHandler>, usize, u32);

/// Retry waiting for its deadline: ready-at + input index + next attempt.
type Pending = (Instant, usize, u32);

/// Drive `specs` to completion. Entry `i` of the returned vector belongs to
/// `specs[i]`.
pub(super) fn run_multi(
    session: &Session,
    specs: &[RequestSpec],
    policy: &FetchPolicy,
    state: &mut BatchState,
    progress: Option<&dyn ProgressSink>,
) -> Result<Vec<FetchResult>, FetchError> {
    let multi = session.multi();
    let mut slots: Vec<Option<FetchResult>> = (0..specs.len()).map(|_| None).collect();
    let mut active: Vec<Active> = Vec::with_capacity(specs.len());
    let mut retry_after: Vec<Pending> = Vec::new();

    for (index, spec) in specs.iter().enumerate() {
        if let Err(failure) = spec.validate() {
            tracing::warn!(index, error = %failure, "skipping request");
            slots[index] = Some(FetchResult::failed(index, failure));
            continue;
        }
        dispatch(session, spec, index, 1, &mut active, &mut slots)?;
    }

    while !active.is_empty() || !retry_after.is_empty() {
        multi.perform().map_err(FetchError::Engine)?;

        let mut completed: Vec<(usize, Result<(), curl::Error>)> = Vec::new();
        multi.messages(|msg| {
            for (i, (handle, ..)) in active.iter().enumerate() {
                if let Some(res) = msg.result_for2(handle) {
                    completed.push((i, res));
                    break;
                }
            }
        });
        // Remove from the back so earlier positions stay valid.
        completed.sort_by(|a, b| b.0.cmp(&a.0));
        for (i, perform) in completed {
            let (handle, index, attempt) = active.remove(i);
            let easy: Easy2<ResponseHandler> = multi.remove2(handle).map_err(FetchError::Engine)?;
            let code = easy.response_code().unwrap_or(0);
            match executor::complete(perform, code, easy.get_ref()) {
                Ok(body) => {
                    if let Some(p) = progress {
                        p.advance();
                    }
                    slots[index] = Some(FetchResult::success(index, body));
                }
                Err(err) => {
                    match executor::resolve_error(&err, attempt, policy, state, specs[index].url()) {
                        Resolution::Retry(delay) => {
                            retry_after.push((Instant::now() + delay, index, attempt + 1));
                        }
                        Resolution::Fail(failure) => {
                            slots[index] = Some(FetchResult::failed(index, failure));
                        }
                    }
                }
            }
        }

        let now = Instant::now();
        let mut k = 0;
        while k < retry_after.len() {
            if retry_after[k].0 <= now {
                let (_, index, attempt) = retry_after.swap_remove(k);
                dispatch(session, &specs[index], index, attempt, &mut active, &mut slots)?;
            } else {
                k += 1;
            }
        }

        if active.is_empty() {
            if !retry_after.is_empty() {
                std::thread::sleep(next_retry_wait(&retry_after));
            }
        } else {
            multi
                .wait(&mut [], next_retry_wait(&retry_after))
                .map_err(FetchError::Engine)?;
        }
    }

    // The loop only exits once every slot has been resolved.
    let results: Vec<FetchResult> = slots.into_iter().flatten().collect();
    debug_assert_eq!(results.len(), specs.len());
    Ok(results)
}

/// Add a transfer for `spec`. A handle that cannot even be configured
/// resolves its slot immediately; only a multi-handle failure is an `Err`.
fn dispatch(
    session: &Session,
    spec: &RequestSpec,
    index: usize,
    attempt: u32,
    active: &mut Vec<Active>,
    slots: &mut [Option<FetchResult>],
) -> Result<(), FetchError> {
    let easy = match executor::prepare(session, spec) {
        Ok(easy) => easy,
        Err(e) => {
            tracing::warn!(index, url = spec.url(), error = %e, "failed to prepare request");
            slots[index] = Some(FetchResult::failed(
                index,
                Failure::Transport {
                    message: e.to_string(),
                },
            ));
            return Ok(());
        }
    };
    let handle = session.multi().add2(easy).map_err(FetchError::Engine)?;
    tracing::trace!(index, attempt, url = spec.url(), "dispatched");
    active.push((handle, index, attempt));
    Ok(())
}

/// Time until the earliest pending retry is due, capped at `MAX_WAIT`.
fn next_retry_wait(retry_after: &[Pending]) -> Duration {
    let now = Instant::now();
    retry_after
        .iter()
        .map(|(t, ..)| t.saturating_duration_since(now))
        .min()
        .unwrap_or(MAX_WAIT)
        .min(MAX_WAIT)
}
