//! Integration tests for s3httpd.
//!
//! Most tests start the real hyper server in-process on an ephemeral port,
//! backed by the in-memory backend, and talk to it over TCP with `reqwest`.
//!
//! Tests against a live S3-compatible endpoint are marked `#[ignore]`. Run
//! them with:
//! ```text
//! S3_ENDPOINT_URL=http://localhost:9000 cargo test -p s3httpd-integration -- --ignored
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Once};

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use s3httpd_core::backend::MemoryBackend;
use s3httpd_core::{ObjectBackend, Proxy, ProxyConfig};
use s3httpd_http::{ProxyHttpConfig, ProxyHttpService, serve};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A proxy served on `127.0.0.1` for the duration of a test.
#[derive(Debug)]
pub struct TestServer<B: ObjectBackend + ?Sized> {
    addr: SocketAddr,
    backend: Arc<B>,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl TestServer<MemoryBackend> {
    /// Serve `backend` as bucket `demo` mounted under `prefix`.
    pub async fn memory(backend: MemoryBackend, prefix: &str) -> Self {
        let config = ProxyConfig::builder()
            .bucket("demo".into())
            .prefix(prefix.into())
            .build()
            .validate()
            .expect("valid config");
        Self::start(config, Arc::new(backend)).await
    }
}

impl<B: ObjectBackend + ?Sized> TestServer<B> {
    /// Serve `backend` with `config` on an ephemeral port.
    pub async fn start(config: ProxyConfig, backend: Arc<B>) -> Self {
        init_tracing();

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let http_config = ProxyHttpConfig::from(&config);
        let service = ProxyHttpService::new(Proxy::new(config, Arc::clone(&backend)), http_config);

        let (shutdown, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve(listener, service, async {
            rx.await.ok();
        }));

        Self {
            addr,
            backend,
            shutdown,
            handle,
        }
    }

    /// Absolute URL for `path` on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// The backend behind the proxy.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Stop accepting and wait for in-flight requests to drain.
    pub async fn stop(self) {
        self.shutdown.send(()).ok();
        self.handle.await.expect("server task");
    }
}

/// HTTP client that ignores proxy environment variables.
#[must_use]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("http client")
}

/// Endpoint URL for a live S3-compatible server.
fn s3_endpoint_url() -> String {
    std::env::var("S3_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:9000".to_owned())
}

/// S3 client pointing at the live endpoint with static test credentials.
#[must_use]
pub fn s3_client() -> aws_sdk_s3::Client {
    init_tracing();

    let access_key = std::env::var("AWS_ACCESS_KEY_ID").unwrap_or_else(|_| "test".to_owned());
    let secret_key = std::env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_else(|_| "test".to_owned());
    let creds = Credentials::new(access_key, secret_key, None, None, "integration-test");

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(creds)
        .endpoint_url(s3_endpoint_url())
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("s3httpd-{prefix}-{id}")
}

mod test_object;
mod test_prefix;
mod test_s3;
