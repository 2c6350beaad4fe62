//! s3httpd - read-only HTTP front end for a single S3 bucket.
//!
//! `GET /` renders an HTML index of the bucket; `GET /<key>` streams the
//! object as a download. Conditional requests with `If-None-Match` are passed
//! through to S3.
//!
//! # Usage
//!
//! ```text
//! s3httpd --bucket my-bucket --listen :8080
//! BUCKET=my-bucket PREFIX=files s3httpd
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `BUCKET` | *(required)* | Bucket to serve |
//! | `PREFIX` | *(empty)* | Path prefix the proxy is mounted under |
//! | `AWS_REGION` | `us-east-1` | Bucket region |
//! | `S3_ENDPOINT` | *(unset)* | Alternate S3 endpoint, path-style |
//! | `LOG_REQUESTS` | `true` | Access log on target `s3httpd::access` |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use s3httpd_core::Proxy;
use s3httpd_core::backend::S3Backend;
use s3httpd_http::{ProxyHttpConfig, ProxyHttpService, serve};

use crate::cli::Cli;

/// Version printed by `--version`.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("received shutdown signal, draining connections");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("s3httpd v{VERSION}");
        return Ok(());
    }

    let config = cli
        .into_config()
        .validate()
        .context("invalid configuration")?;

    init_tracing(&config.log_level)?;

    info!(
        listen = %config.listen,
        bucket = %config.bucket,
        prefix = %config.prefix,
        region = %config.region,
        s3_endpoint = ?config.s3_endpoint,
        version = VERSION,
        "starting s3httpd",
    );

    let addr = config.listen_addr()?;
    let backend = S3Backend::from_config(&config).await;
    let http_config = ProxyHttpConfig::from(&config);
    let service = ProxyHttpService::new(Proxy::new(config, Arc::new(backend)), http_config);

    let listener = TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to read bound address")?;

    info!(addr = %local_addr, "listening for connections");

    serve(listener, service, shutdown_signal()).await;
    info!("exiting");

    Ok(())
}
