//! The request handler tying resolution, listing and fetching together.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::backend::ObjectBackend;
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::fetch::{FetchedObject, fetch_object};
use crate::listing::{ListingPage, list_bucket};
use crate::resolver::{RequestContext, Target};

/// Successful outcome of a request.
#[derive(Debug)]
pub enum ProxyResponse {
    /// The bucket index.
    Listing(ListingPage),
    /// An object to stream.
    Object(FetchedObject),
}

/// Read-only proxy over one bucket.
///
/// Both the configuration and the backend are `Arc`-wrapped; cloning a proxy
/// for each connection shares them without copying.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use s3httpd_core::backend::{MemoryBackend, MemoryObject};
/// use s3httpd_core::{Proxy, ProxyConfig, ProxyResponse};
///
/// # tokio_test::block_on(async {
/// let backend = MemoryBackend::new().with_object(MemoryObject::new("a.txt", "alpha"));
/// let config = ProxyConfig::builder().bucket("demo".into()).build();
/// let proxy = Proxy::new(config, Arc::new(backend));
///
/// let ctx = proxy.resolve("/a.txt", None).unwrap();
/// assert!(matches!(proxy.handle(&ctx).await, Ok(ProxyResponse::Object(_))));
/// # });
/// ```
pub struct Proxy<B: ?Sized> {
    config: Arc<ProxyConfig>,
    backend: Arc<B>,
}

impl<B: ObjectBackend + ?Sized> Proxy<B> {
    /// Create a proxy over `backend`.
    #[must_use]
    pub fn new(config: ProxyConfig, backend: Arc<B>) -> Self {
        Self {
            config: Arc::new(config),
            backend,
        }
    }

    /// The proxy configuration.
    #[must_use]
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The storage backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Build the request context for `raw_path` against the configured prefix.
    pub fn resolve(
        &self,
        raw_path: &str,
        if_none_match: Option<String>,
    ) -> Result<RequestContext, ProxyError> {
        RequestContext::resolve(raw_path, if_none_match, &self.config.prefix)
    }

    /// Serve a resolved request.
    pub async fn handle(&self, ctx: &RequestContext) -> Result<ProxyResponse, ProxyError> {
        let bucket = self.config.bucket.as_str();
        match &ctx.target {
            Target::Listing => {
                debug!(bucket, path = %ctx.raw_path, "listing bucket");
                list_bucket(self.backend.as_ref(), bucket, &self.config.prefix)
                    .await
                    .map(ProxyResponse::Listing)
            }
            Target::Object(key) => {
                debug!(
                    bucket,
                    path = %ctx.raw_path,
                    key = %key,
                    if_none_match = ?ctx.if_none_match,
                    "fetching object"
                );
                fetch_object(
                    self.backend.as_ref(),
                    bucket,
                    key,
                    ctx.if_none_match.as_deref(),
                )
                .await
                .map(ProxyResponse::Object)
            }
        }
    }
}

impl<B: ?Sized> Clone for Proxy<B> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: ?Sized> fmt::Debug for Proxy<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("config", &self.config)
            .field("backend", &"...")
            .finish()
    }
}
