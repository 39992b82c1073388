//! Credential transform: PKCS#12 client certificate bundle to PEM trust material.
//!
//! The bundle is decrypted in memory with OpenSSL. Nothing touches disk until a
//! session stages the material for libcurl (see [`StagedPem`]), and the staged
//! files live exactly as long as the staging value.

mod staging;

#[cfg(test)]
pub(crate) mod fixtures;

use openssl::pkcs12::Pkcs12;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{compiler_fence, Ordering};

use crate::error::CredentialError;

pub use staging::StagedPem;

/// Encrypted PKCS#12 bundle plus its password, as supplied by the caller.
pub struct CertificateBundle {
    bytes: Vec<u8>,
    password: String,
}

impl CertificateBundle {
    pub fn new(bytes: Vec<u8>, password: impl Into<String>) -> Self {
        Self {
            bytes,
            password: password.into(),
        }
    }

    /// Read a `.p12` / `.pfx` file from disk.
    pub fn from_path(path: impl AsRef<Path>, password: impl Into<String>) -> Result<Self, CredentialError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| CredentialError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(bytes, password))
    }

    /// Decrypt this bundle into fresh trust material.
    pub fn decrypt(&self) -> Result<TrustMaterial, CredentialError> {
        decrypt(&self.bytes, &self.password)
    }
}

impl fmt::Debug for CertificateBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateBundle")
            .field("bytes", &self.bytes.len())
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Drop for CertificateBundle {
    fn drop(&mut self) {
        wipe(&mut std::mem::take(&mut self.password).into_bytes());
    }
}

/// Decoded client identity: PKCS#8 private key, leaf certificate and any
/// bundled chain certificates, all PEM encoded.
///
/// Not `Clone`: a session owns exactly one instance, and the buffers are
/// zeroed on drop.
pub struct TrustMaterial {
    key_pem: Vec<u8>,
    leaf_pem: Vec<u8>,
    chain_pem: Vec<Vec<u8>>,
}

impl TrustMaterial {
    /// Build from PEM that was decoded elsewhere. Pairing of key and leaf is
    /// checked when a session is opened, not here.
    pub fn from_pem(key_pem: Vec<u8>, leaf_pem: Vec<u8>, chain_pem: Vec<Vec<u8>>) -> Self {
        Self {
            key_pem,
            leaf_pem,
            chain_pem,
        }
    }

    /// Unencrypted PKCS#8 private key.
    pub fn key_pem(&self) -> &[u8] {
        &self.key_pem
    }

    pub fn leaf_pem(&self) -> &[u8] {
        &self.leaf_pem
    }

    /// Intermediate/CA certificates that shipped with the bundle (may be empty).
    pub fn chain_pem(&self) -> &[Vec<u8>] {
        &self.chain_pem
    }

    /// Leaf plus chain.
    pub fn certificate_count(&self) -> usize {
        1 + self.chain_pem.len()
    }

    /// Leaf followed by the chain, as presented to the server during the handshake.
    pub fn certificate_chain_pem(&self) -> Vec<u8> {
        let mut out = self.leaf_pem.clone();
        for ca in &self.chain_pem {
            out.extend_from_slice(ca);
        }
        out
    }

    /// Write the material to owner-only temp files for libraries that need paths.
    pub fn stage(&self) -> Result<StagedPem, CredentialError> {
        StagedPem::write(self)
    }
}

impl fmt::Debug for TrustMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustMaterial")
            .field("key_pem", &"<redacted>")
            .field("certificates", &self.certificate_count())
            .finish()
    }
}

impl Drop for TrustMaterial {
    fn drop(&mut self) {
        wipe(&mut self.key_pem);
        wipe(&mut self.leaf_pem);
        for ca in &mut self.chain_pem {
            wipe(ca);
        }
    }
}

/// Decrypt a PKCS#12 bundle. Performs no file I/O.
pub fn decrypt(bundle: &[u8], password: &str) -> Result<TrustMaterial, CredentialError> {
    let parsed = Pkcs12::from_der(bundle)
        .and_then(|p12| p12.parse2(password))
        .map_err(CredentialError::Decrypt)?;

    let pkey = parsed.pkey.ok_or(CredentialError::MissingKey)?;
    let cert = parsed.cert.ok_or(CredentialError::MissingCertificate)?;

    let key_pem = pkey
        .private_key_to_pem_pkcs8()
        .map_err(CredentialError::Encode)?;
    let leaf_pem = cert.to_pem().map_err(CredentialError::Encode)?;
    let chain_pem = match parsed.ca {
        Some(stack) => stack
            .iter()
            .map(|ca| ca.to_pem())
            .collect::<Result<Vec<_>, _>>()
            .map_err(CredentialError::Encode)?,
        None => Vec::new(),
    };

    tracing::debug!(chain = chain_pem.len(), "decrypted client certificate bundle");
    Ok(TrustMaterial {
        key_pem,
        leaf_pem,
        chain_pem,
    })
}

/// Read and decrypt a bundle from disk.
pub fn load(path: impl AsRef<Path>, password: &str) -> Result<TrustMaterial, CredentialError> {
    CertificateBundle::from_path(path, password)?.decrypt()
}

fn wipe(buf: &mut Vec<u8>) {
    zero(buf);
    buf.clear();
}

/// Volatile stores so the zeroing is not elided as a dead write before free.
fn zero(buf: &mut [u8]) {
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, aligned, exclusive reference.
        unsafe { std::ptr::write_volatile(byte, 0) };
    }
    compiler_fence(Ordering::SeqCst);
}
