//! Proxy configuration.
//!
//! Provides [`ProxyConfig`], the process-wide settings for s3httpd. A config is
//! built once at startup (usually from command-line flags with environment
//! fallbacks), checked with [`ProxyConfig::validate`], and never mutated
//! afterwards.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Smallest header buffer hyper accepts for HTTP/1 connections.
pub const MIN_HEADER_BYTES: usize = 8192;

/// Errors raised while validating a [`ProxyConfig`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No bucket name was given.
    #[error("bucket name required")]
    MissingBucket,

    /// The listen address could not be parsed.
    #[error("invalid listen address: {0}")]
    InvalidListenAddress(String),

    /// The header buffer limit is below what the HTTP server supports.
    #[error("max header bytes must be at least {MIN_HEADER_BYTES}, got {0}")]
    HeaderLimitTooSmall(usize),
}

/// s3httpd configuration.
///
/// # Examples
///
/// ```
/// use s3httpd_core::config::ProxyConfig;
///
/// let config = ProxyConfig::builder()
///     .bucket("demo".into())
///     .prefix("/files/".into())
///     .build()
///     .validate()
///     .unwrap();
/// assert_eq!(config.prefix, "files");
/// assert_eq!(config.listen, "0.0.0.0:8080");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    /// Address to listen on (`"host:port"` or `":port"`).
    #[builder(default = String::from("0.0.0.0:8080"))]
    pub listen: String,

    /// The bucket exposed by this proxy.
    pub bucket: String,

    /// Path segment the proxy is mounted under, without surrounding slashes.
    #[builder(default)]
    pub prefix: String,

    /// Region used to build the S3 client.
    #[builder(default = String::from("us-east-1"))]
    pub region: String,

    /// Alternate S3 endpoint (e.g. a MinIO server). Enables path-style addressing.
    #[builder(default)]
    pub s3_endpoint: Option<String>,

    /// Whether to emit one access log line per request.
    #[builder(default = true)]
    pub log_requests: bool,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Seconds allowed for a client to send its request headers. `0` disables the limit.
    #[builder(default = 10)]
    pub header_read_timeout_secs: u64,

    /// Upper bound on the size of request headers.
    #[builder(default = 1_048_576)]
    pub max_header_bytes: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen: String::from("0.0.0.0:8080"),
            bucket: String::new(),
            prefix: String::new(),
            region: String::from("us-east-1"),
            s3_endpoint: None,
            log_requests: true,
            log_level: String::from("info"),
            header_read_timeout_secs: 10,
            max_header_bytes: 1_048_576,
        }
    }
}

impl ProxyConfig {
    /// Check the configuration and normalize the prefix.
    ///
    /// The bucket must be non-empty, the listen address must parse, and the
    /// header limit must be usable. Slashes around the prefix are trimmed so that
    /// `"/files/"`, `"files/"` and `"files"` all mount the proxy at `/files`.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        self.bucket = self.bucket.trim().to_owned();
        if self.bucket.is_empty() {
            return Err(ConfigError::MissingBucket);
        }
        if self.max_header_bytes < MIN_HEADER_BYTES {
            return Err(ConfigError::HeaderLimitTooSmall(self.max_header_bytes));
        }
        self.prefix = normalize_prefix(&self.prefix);
        self.s3_endpoint = self.s3_endpoint.filter(|e| !e.trim().is_empty());
        self.listen_addr()?;
        Ok(self)
    }

    /// The listen address in `host:port` form.
    ///
    /// A bare `":port"` binds all interfaces. The host may be an IP literal
    /// (`[::1]` for IPv6) or a name such as `localhost`; names are resolved
    /// when the listener is bound.
    pub fn listen_addr(&self) -> Result<String, ConfigError> {
        let addr = if self.listen.starts_with(':') {
            format!("0.0.0.0{}", self.listen)
        } else {
            self.listen.trim().to_owned()
        };
        let valid = addr
            .rsplit_once(':')
            .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
        if valid {
            Ok(addr)
        } else {
            Err(ConfigError::InvalidListenAddress(self.listen.clone()))
        }
    }

    /// Header read timeout, or `None` when disabled.
    #[must_use]
    pub fn header_read_timeout(&self) -> Option<Duration> {
        (self.header_read_timeout_secs > 0)
            .then(|| Duration::from_secs(self.header_read_timeout_secs))
    }
}

/// Trim surrounding slashes from a mount prefix.
fn normalize_prefix(prefix: &str) -> String {
    prefix.trim().trim_matches('/').to_owned()
}
