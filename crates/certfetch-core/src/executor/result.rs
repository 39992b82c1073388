//! Per-slot outcome of a batch.

use serde::Serialize;
use serde_json::Value;

/// Why a request's slot resolved without a body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// Non-2xx answer after the batch passed its server-error threshold.
    #[error("server responded with HTTP {status}")]
    ServerResponse { status: u32 },
    /// Every allowed attempt failed with a retryable error.
    #[error("gave up after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },
    /// Network-level timeout; the request is not retried.
    #[error("request timed out")]
    Timeout,
    /// Non-retryable transport failure (TLS handshake rejected, bad option, ...).
    #[error("transport error: {message}")]
    Transport { message: String },
    /// Never dispatched.
    #[error("invalid URL: {message}")]
    InvalidUrl { message: String },
}

/// Result for the request at `index` in the batch input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResult {
    index: usize,
    success: bool,
    body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<Failure>,
}

impl FetchResult {
    pub fn success(index: usize, body: Value) -> Self {
        Self {
            index,
            success: true,
            body: Some(body),
            failure: None,
        }
    }

    pub fn failed(index: usize, failure: Failure) -> Self {
        Self {
            index,
            success: false,
            body: None,
            failure: Some(failure),
        }
    }

    /// Position of the originating request in the batch input.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    pub fn into_body(self) -> Option<Value> {
        self.body
    }
}
