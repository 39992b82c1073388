//! CLI for the certfetch client-certificate fetch engine.

mod commands;

use anyhow::Result;
use certfetch_core::config;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_check, run_get, run_post};

/// Top-level CLI for certfetch.
#[derive(Debug, Parser)]
#[command(name = "certfetch")]
#[command(about = "certfetch: concurrent JSON fetches over mutual TLS", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Where the client identity and its password come from.
#[derive(Debug, Clone, Args)]
pub struct CertArgs {
    /// PKCS#12 bundle (.p12 / .pfx) holding the client key and certificate.
    #[arg(long, value_name = "P12")]
    pub cert: PathBuf,

    /// Read the bundle password from this environment variable (default CERTFETCH_PASSWORD).
    #[arg(long, value_name = "VAR", conflicts_with = "password_file")]
    pub password_env: Option<String>,

    /// Read the bundle password from the first line of this file.
    #[arg(long, value_name = "FILE")]
    pub password_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// GET every URL concurrently and print the JSON results in input order.
    Get {
        #[command(flatten)]
        cert: CertArgs,

        /// Fetch one URL at a time without retries; stop at the first error.
        #[arg(long)]
        sync: bool,

        /// Target URLs.
        #[arg(required = true, value_name = "URL")]
        urls: Vec<String>,
    },

    /// POST each payload of a JSON array to one URL concurrently.
    Post {
        #[command(flatten)]
        cert: CertArgs,

        /// Target URL for every payload.
        #[arg(long)]
        url: String,

        /// File containing a JSON array; each element is sent as one request body.
        #[arg(long, value_name = "FILE")]
        bodies: PathBuf,
    },

    /// Decrypt the bundle and validate the identity without sending any request.
    Check {
        #[command(flatten)]
        cert: CertArgs,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get { cert, sync, urls } => run_get(&cfg, &cert, urls, sync).await?,
            CliCommand::Post { cert, url, bodies } => run_post(&cfg, &cert, &url, &bodies).await?,
            CliCommand::Check { cert } => run_check(&cfg, &cert)?,
        }

        Ok(())
    }
}
