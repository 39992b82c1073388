//! Owner-only temp files holding staged PEM material.
//!
//! libcurl takes the client certificate and key as file paths and re-reads
//! them for every new connection, so the files must outlive the handshake but
//! not the session. Both are `NamedTempFile`s: created 0600 and unlinked on
//! drop, including when staging fails halfway or a panic unwinds.

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::CredentialError;

use super::TrustMaterial;

/// Staged certificate chain and private key. Dropping this deletes both files.
#[derive(Debug)]
pub struct StagedPem {
    cert: NamedTempFile,
    key: NamedTempFile,
}

impl StagedPem {
    pub(super) fn write(material: &TrustMaterial) -> Result<Self, CredentialError> {
        let cert = stage_file("certfetch-cert-", &material.certificate_chain_pem())?;
        // If this fails, `cert` is dropped and removed before we return.
        let key = stage_file("certfetch-key-", material.key_pem())?;
        tracing::debug!(cert = %cert.path().display(), "staged client identity");
        Ok(Self { cert, key })
    }

    /// Leaf certificate followed by the bundled chain.
    pub fn cert_path(&self) -> &Path {
        self.cert.path()
    }

    pub fn key_path(&self) -> &Path {
        self.key.path()
    }
}

fn stage_file(prefix: &str, data: &[u8]) -> Result<NamedTempFile, CredentialError> {
    let mut file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".pem")
        .tempfile()
        .map_err(CredentialError::Stage)?;
    file.write_all(data).map_err(CredentialError::Stage)?;
    file.as_file().sync_all().map_err(CredentialError::Stage)?;
    Ok(file)
}
