//! Caller-facing facade: certificate + URLs in, ordered results + timings out.
//!
//! Each call decrypts the bundle, opens a fresh [`Session`], runs one batch,
//! closes the session and appends the call's duration to the fetcher's
//! [`DurationLog`]. Credential and TLS configuration errors return before any
//! request is dispatched.
//!
//! Everything here blocks the calling thread; call from `spawn_blocking` if
//! used from async code.

use serde_json::Value;
use std::time::Instant;

use crate::batch::{self, fallback, BatchReport, DurationLog};
use crate::config::FetchConfig;
use crate::credential::CertificateBundle;
use crate::error::FetchError;
use crate::executor::{FetchPolicy, RequestSpec};
use crate::progress::ProgressSink;
use crate::retry::RequestError;
use crate::session::{Session, SessionOptions};

/// Error from the blocking fallback path, which surfaces request errors directly.
#[derive(Debug, thiserror::Error)]
pub enum BlockingFetchError {
    #[error(transparent)]
    Setup(#[from] FetchError),
    #[error("request failed: {0}")]
    Request(#[from] RequestError),
}

#[derive(Debug, Default)]
pub struct Fetcher {
    session_options: SessionOptions,
    policy: FetchPolicy,
    durations: DurationLog,
}

impl Fetcher {
    pub fn new(session_options: SessionOptions, policy: FetchPolicy) -> Self {
        Self {
            session_options,
            policy,
            durations: DurationLog::new(),
        }
    }

    pub fn from_config(cfg: &FetchConfig) -> Self {
        Self::new(cfg.session_options(), cfg.fetch_policy())
    }

    /// Durations of every call made through this fetcher.
    pub fn durations(&self) -> &[String] {
        self.durations.entries()
    }

    /// GET every URL concurrently.
    pub fn fetch_get<S: AsRef<str>>(
        &mut self,
        bundle: &CertificateBundle,
        urls: &[S],
        progress: Option<&dyn ProgressSink>,
    ) -> Result<(BatchReport, Vec<String>), FetchError> {
        self.run(bundle, batch::get_requests(urls), progress)
    }

    /// POST each payload to `url` concurrently.
    pub fn fetch_post(
        &mut self,
        bundle: &CertificateBundle,
        url: &str,
        bodies: Vec<Value>,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<(BatchReport, Vec<String>), FetchError> {
        self.run(bundle, batch::post_requests(url, bodies), progress)
    }

    /// GET every URL one at a time, without retries; the first failure is returned as-is.
    pub fn fetch_get_blocking(
        &mut self,
        bundle: &CertificateBundle,
        urls: &[String],
    ) -> Result<(Vec<Value>, Vec<String>), BlockingFetchError> {
        let start = Instant::now();
        let session = self.open(bundle)?;
        let out = fallback::get_all_blocking(&session, urls);
        session.close();
        self.durations.record(start.elapsed());
        Ok((out?, self.durations.entries().to_vec()))
    }

    fn run(
        &mut self,
        bundle: &CertificateBundle,
        specs: Vec<RequestSpec>,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<(BatchReport, Vec<String>), FetchError> {
        let start = Instant::now();
        let session = self.open(bundle)?;
        let report = batch::run_batch(&session, specs, &self.policy, progress);
        session.close();
        let report = report?;
        let entry = self.durations.record(start.elapsed()).to_string();
        tracing::debug!(batches = self.durations.len(), "{}", entry);
        Ok((report, self.durations.entries().to_vec()))
    }

    fn open(&self, bundle: &CertificateBundle) -> Result<Session, FetchError> {
        let material = bundle.decrypt()?;
        Ok(Session::open(material, self.session_options.clone())?)
    }
}
