use serde::Serialize;

/// Error accounting for one batch. Created fresh per batch and handed back in
/// the [`BatchReport`](super::BatchReport).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchState {
    /// Non-2xx responses seen across all requests of the batch.
    pub server_response_errors: u32,
    /// Requests resolved as timed out.
    pub timeout_errors: u32,
    /// Requests that stopped retrying because the batch passed its
    /// server-error threshold.
    pub escalations: u32,
    /// Retries scheduled (attempts beyond the first).
    pub retries: u32,
}

impl BatchState {
    /// True once the circuit-break threshold has been crossed in this batch.
    pub fn is_escalated(&self) -> bool {
        self.escalations > 0
    }
}
