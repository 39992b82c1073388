//! Concurrent, client-certificate-authenticated HTTP fetch engine.
//!
//! Pipeline: [`credential`] decrypts a PKCS#12 bundle into PEM trust
//! material, [`session`] turns it into a pooled mutual-TLS client,
//! [`batch`] fans requests out over that pool, and [`executor`] judges each
//! transfer and applies the shared [`retry`] policy. [`fetch::Fetcher`] wires
//! the stages together for callers holding a bundle and a list of URLs.

pub mod config;
pub mod logging;

pub mod batch;
pub mod credential;
pub mod error;
pub mod executor;
pub mod fetch;
pub mod progress;
pub mod retry;
pub mod session;

pub use batch::{BatchReport, BatchState, DurationLog};
pub use credential::{CertificateBundle, TrustMaterial};
pub use error::{CredentialError, FetchError, TlsConfigError};
pub use executor::{Failure, FetchPolicy, FetchResult, Method, RequestSpec};
pub use fetch::Fetcher;
pub use progress::{ProgressEvent, ProgressSink};
pub use session::{CaRoots, Session, SessionOptions};
