//! Error types for the fetch engine.
//!
//! Configuration-level errors (`CredentialError`, `TlsConfigError`) abort a
//! batch before anything is dispatched. Per-request failures never surface as
//! `Err`; they resolve the request's slot to a [`Failure`](crate::executor::Failure).

use std::path::PathBuf;

/// The certificate bundle could not be turned into trust material.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The bundle file could not be read.
    #[error("failed to read certificate bundle {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Wrong password, or the bytes are not a supported PKCS#12 container.
    #[error("failed to decrypt certificate bundle (wrong password or malformed bundle): {0}")]
    Decrypt(#[source] openssl::error::ErrorStack),
    /// The bundle decrypted but carries no private key.
    #[error("certificate bundle contains no private key")]
    MissingKey,
    /// The bundle decrypted but carries no leaf certificate.
    #[error("certificate bundle contains no certificate")]
    MissingCertificate,
    /// Key or certificate could not be serialized to PEM.
    #[error("failed to encode trust material as PEM: {0}")]
    Encode(#[source] openssl::error::ErrorStack),
    /// Writing the owner-only staging files failed.
    #[error("failed to stage trust material: {0}")]
    Stage(#[source] std::io::Error),
}

/// Trust material could not be loaded into a TLS client configuration.
#[derive(Debug, thiserror::Error)]
pub enum TlsConfigError {
    /// Key and leaf certificate could not be loaded together into a TLS context.
    #[error("client key and certificate do not form a usable TLS identity: {0}")]
    Identity(#[source] openssl::error::ErrorStack),
    /// The configured CA root bundle does not exist.
    #[error("CA bundle not found: {0}")]
    CaBundleMissing(PathBuf),
    /// Connection pool options were rejected by libcurl.
    #[error("failed to configure connection pool: {0}")]
    Pool(#[source] curl::MultiError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

/// Error returned by the batch-level entry points.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    TlsConfig(#[from] TlsConfigError),
    /// The multi handle driving the batch failed (not a per-request error).
    #[error("transfer engine failed: {0}")]
    Engine(#[source] curl::MultiError),
}
