//! Password lookup and bundle loading shared by every command.

use anyhow::{Context, Result};
use certfetch_core::CertificateBundle;
use std::fs;

use crate::cli::CertArgs;

/// Environment variable consulted when neither `--password-env` nor `--password-file` is given.
pub const DEFAULT_PASSWORD_ENV: &str = "CERTFETCH_PASSWORD";

pub fn read_password(args: &CertArgs) -> Result<String> {
    if let Some(path) = &args.password_file {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read password file {}", path.display()))?;
        let first = raw.lines().next().unwrap_or_default();
        return Ok(first.to_string());
    }
    let var = args.password_env.as_deref().unwrap_or(DEFAULT_PASSWORD_ENV);
    std::env::var(var).with_context(|| {
        format!(
            "no bundle password: set {} or pass --password-env / --password-file",
            var
        )
    })
}

pub fn load_bundle(args: &CertArgs) -> Result<CertificateBundle> {
    let password = read_password(args)?;
    CertificateBundle::from_path(&args.cert, password)
        .with_context(|| format!("failed to load certificate bundle {}", args.cert.display()))
}
