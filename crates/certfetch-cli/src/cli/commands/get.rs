//! `certfetch get <url>...` – concurrent GETs, or sequential with `--sync`.

use anyhow::{Context, Result};
use certfetch_core::config::FetchConfig;
use certfetch_core::Fetcher;

use super::credentials::load_bundle;
use super::output::{print_durations, print_json, print_report, BarSink};
use crate::cli::CertArgs;

pub async fn run_get(cfg: &FetchConfig, cert: &CertArgs, urls: Vec<String>, sync: bool) -> Result<()> {
    let bundle = load_bundle(cert)?;
    let mut fetcher = Fetcher::from_config(cfg);

    if sync {
        let (values, durations) =
            tokio::task::spawn_blocking(move || fetcher.fetch_get_blocking(&bundle, &urls))
                .await
                .context("fetch task join")??;
        print_json(&values)?;
        print_durations(&durations);
        return Ok(());
    }

    let (report, durations) = tokio::task::spawn_blocking(move || {
        let bar = BarSink::new();
        let out = fetcher.fetch_get(&bundle, &urls, Some(&bar));
        bar.finish();
        out
    })
    .await
    .context("fetch task join")??;
    print_report(&report, &durations)
}
