//! Command-line flags with environment fallbacks.

use clap::{ArgAction, Parser};

use s3httpd_core::ProxyConfig;

/// Serve a single S3 bucket over plain HTTP.
///
/// Every flag can also be set through the environment variable shown in
/// `--help`; flags take precedence.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "s3httpd", disable_version_flag = true)]
pub struct Cli {
    /// Address to listen on (`host:port` or `:port`).
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: String,

    /// Bucket to serve.
    #[arg(long, env = "BUCKET", default_value = "")]
    pub bucket: String,

    /// Path prefix the proxy is mounted under.
    #[arg(long, env = "PREFIX", default_value = "")]
    pub prefix: String,

    /// AWS region of the bucket.
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Alternate S3 endpoint URL (MinIO, LocalStack, ...); enables path-style addressing.
    #[arg(long = "s3-endpoint", env = "S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// Log one line per request.
    #[arg(long, env = "LOG_REQUESTS", default_value_t = true, action = ArgAction::Set)]
    pub log_requests: bool,

    /// Log level filter; `RUST_LOG` takes precedence when set.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Seconds allowed for a client to send request headers (0 disables).
    #[arg(long, env = "HEADER_READ_TIMEOUT_SECS", default_value_t = 10)]
    pub header_read_timeout_secs: u64,

    /// Maximum size of the request head in bytes.
    #[arg(long, env = "MAX_HEADER_BYTES", default_value_t = 1_048_576)]
    pub max_header_bytes: usize,

    /// Print version and exit.
    #[arg(long)]
    pub version: bool,
}

impl Cli {
    /// Build the (not yet validated) proxy configuration.
    #[must_use]
    pub fn into_config(self) -> ProxyConfig {
        ProxyConfig::builder()
            .listen(self.listen)
            .bucket(self.bucket)
            .prefix(self.prefix)
            .region(self.region)
            .s3_endpoint(self.s3_endpoint)
            .log_requests(self.log_requests)
            .log_level(self.log_level)
            .header_read_timeout_secs(self.header_read_timeout_secs)
            .max_header_bytes(self.max_header_bytes)
            .build()
    }
}
