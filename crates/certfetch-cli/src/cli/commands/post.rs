//! `certfetch post --url <url> --bodies <file>` – one POST per array element.

use anyhow::{Context, Result};
use certfetch_core::config::FetchConfig;
use certfetch_core::Fetcher;
use serde_json::Value;
use std::fs;
use std::path::Path;

use super::credentials::load_bundle;
use super::output::{print_report, BarSink};
use crate::cli::CertArgs;

pub async fn run_post(cfg: &FetchConfig, cert: &CertArgs, url: &str, bodies: &Path) -> Result<()> {
    let payloads = read_bodies(bodies)?;
    let bundle = load_bundle(cert)?;
    let mut fetcher = Fetcher::from_config(cfg);
    let url = url.to_string();

    let (report, durations) = tokio::task::spawn_blocking(move || {
        let bar = BarSink::new();
        let out = fetcher.fetch_post(&bundle, &url, payloads, Some(&bar));
        bar.finish();
        out
    })
    .await
    .context("fetch task join")??;
    print_report(&report, &durations)
}

fn read_bodies(path: &Path) -> Result<Vec<Value>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read bodies file {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("{} must contain a JSON array of payloads", path.display()))
}
