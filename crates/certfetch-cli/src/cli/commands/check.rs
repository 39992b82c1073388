//! `certfetch check` – decrypt the bundle and validate the identity; no network.

use anyhow::{Context, Result};
use certfetch_core::config::FetchConfig;
use certfetch_core::Session;

use super::credentials::load_bundle;
use crate::cli::CertArgs;

pub fn run_check(cfg: &FetchConfig, cert: &CertArgs) -> Result<()> {
    let bundle = load_bundle(cert)?;
    let material = bundle.decrypt().context("failed to decrypt certificate bundle")?;
    let chain = material.chain_pem().len();
    let session = Session::open(material, cfg.session_options())
        .context("client identity is not usable")?;
    println!("bundle:       {}", cert.cert.display());
    println!("identity:     key matches leaf certificate");
    println!("certificates: {} (leaf + {} chain)", session.certificate_count(), chain);
    println!("server roots: {:?}", session.options().ca_roots);
    session.close();
    Ok(())
}
