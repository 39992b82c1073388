//! TLS session factory: one mutually-authenticated connection pool per batch.
//!
//! A [`Session`] owns the client trust material, the staged PEM files libcurl
//! reads it from, and the curl multi handle whose connection cache every
//! request of the batch shares. Server certificates are verified against
//! [`CaRoots`], which is independent of the client certificate's own chain.

mod options;

use curl::easy::{Easy2, Handler, IpResolve};
use curl::multi::Multi;
use openssl::pkey::PKey;
use openssl::ssl::{SslContext, SslMethod};
use openssl::x509::X509;
use std::fmt;

use crate::credential::{StagedPem, TrustMaterial};
use crate::error::TlsConfigError;

pub use options::{CaRoots, SessionOptions};

/// Live, pooled TLS client bound to one identity and one connection policy.
///
/// Closing (or dropping) the session releases pooled connections, deletes the
/// staged key files and zeroes the trust material.
pub struct Session {
    // Field order matters: connections go first, then the files they were
    // configured from, then the in-memory material.
    multi: Multi,
    staged: StagedPem,
    material: TrustMaterial,
    options: SessionOptions,
}

impl Session {
    /// Validate the identity, stage it for libcurl and build the pool.
    pub fn open(material: TrustMaterial, options: SessionOptions) -> Result<Self, TlsConfigError> {
        verify_identity(&material)?;
        if let CaRoots::Bundle(path) = &options.ca_roots {
            if !path.is_file() {
                return Err(TlsConfigError::CaBundleMissing(path.clone()));
            }
        }

        let staged = material.stage()?;
        let mut multi = Multi::new();
        multi
            .set_max_total_connections(options.max_total_connections)
            .map_err(TlsConfigError::Pool)?;
        multi
            .set_max_host_connections(options.max_connections_per_host)
            .map_err(TlsConfigError::Pool)?;

        tracing::debug!(
            max_total = options.max_total_connections,
            max_per_host = options.max_connections_per_host,
            certificates = material.certificate_count(),
            "opened TLS session"
        );
        Ok(Self {
            multi,
            staged,
            material,
            options,
        })
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Number of client certificates presented during the handshake.
    pub fn certificate_count(&self) -> usize {
        self.material.certificate_count()
    }

    pub(crate) fn multi(&self) -> &Multi {
        &self.multi
    }

    #[cfg(test)]
    pub(crate) fn staged(&self) -> &StagedPem {
        &self.staged
    }

    /// Apply client identity, server verification and transport options to a handle.
    pub(crate) fn configure<H: Handler>(&self, easy: &mut Easy2<H>) -> Result<(), curl::Error> {
        easy.ssl_cert(self.staged.cert_path())?;
        easy.ssl_cert_type("PEM")?;
        easy.ssl_key(self.staged.key_path())?;
        easy.ssl_key_type("PEM")?;
        easy.ssl_verify_peer(true)?;
        easy.ssl_verify_host(true)?;
        if let CaRoots::Bundle(path) = &self.options.ca_roots {
            easy.cainfo(path)?;
        }
        easy.ip_resolve(IpResolve::V4)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        if let Some(t) = self.options.connect_timeout {
            easy.connect_timeout(t)?;
        }
        // No deadline unless the caller asked for one.
        if let Some(t) = self.options.request_timeout {
            easy.timeout(t)?;
        }
        Ok(())
    }

    /// Release the pool and discard the identity.
    pub fn close(self) {
        tracing::debug!("closing TLS session");
        drop(self);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("material", &self.material)
            .field("options", &self.options)
            .finish()
    }
}

/// Load key and leaf into a client context the way the handshake will.
fn verify_identity(material: &TrustMaterial) -> Result<(), TlsConfigError> {
    let key = PKey::private_key_from_pem(material.key_pem()).map_err(TlsConfigError::Identity)?;
    let cert = X509::from_pem(material.leaf_pem()).map_err(TlsConfigError::Identity)?;
    let mut ctx = SslContext::builder(SslMethod::tls_client()).map_err(TlsConfigError::Identity)?;
    ctx.set_certificate(&cert).map_err(TlsConfigError::Identity)?;
    ctx.set_private_key(&key).map_err(TlsConfigError::Identity)?;
    ctx.check_private_key().map_err(TlsConfigError::Identity)?;
    Ok(())
}
