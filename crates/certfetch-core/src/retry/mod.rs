//! Retry and backoff policy.
//!
//! Every retryable failure of a request (server response errors and
//! connection-level failures) goes through one [`RetryPolicy`], so the attempt
//! cap and backoff schedule are shared by all retry paths.

mod classify;
mod error;
mod policy;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use error::RequestError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
