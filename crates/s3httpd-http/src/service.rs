//! The hyper `Service` serving one bucket.
//!
//! [`ProxyHttpService`] handles a request in four steps:
//!
//! 1. Method check: `GET` and `HEAD` are served, anything else gets `405`
//! 2. Path resolution against the mount prefix
//! 3. Listing or object fetch through [`Proxy`]
//! 4. Response serialization, plus one access-log line when enabled
//!
//! `HEAD` runs the same pipeline as `GET` and drops the body before returning,
//! so status and headers are identical.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::header::{HeaderName, IF_NONE_MATCH, REFERER, USER_AGENT};
use http::request::Parts;
use http::{HeaderMap, Method, Response};
use hyper::service::Service;
use tracing::{debug, info};

use s3httpd_core::{ObjectBackend, Proxy, ProxyConfig};

use crate::body::ProxyBody;
use crate::response::{method_not_allowed_response, proxy_response};

/// Access log target, so request logging can be filtered on its own.
pub const ACCESS_LOG_TARGET: &str = "s3httpd::access";

/// Configuration for the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyHttpConfig {
    /// Emit one access-log line per request.
    pub log_requests: bool,
    /// Time allowed for a client to send the request head; `None` disables it.
    pub header_read_timeout: Option<Duration>,
    /// Upper bound on the HTTP/1 read buffer, which bounds the request head.
    pub max_header_bytes: usize,
}

impl Default for ProxyHttpConfig {
    fn default() -> Self {
        Self::from(&ProxyConfig::default())
    }
}

impl From<&ProxyConfig> for ProxyHttpConfig {
    fn from(config: &ProxyConfig) -> Self {
        Self {
            log_requests: config.log_requests,
            header_read_timeout: config.header_read_timeout(),
            max_header_bytes: config.max_header_bytes,
        }
    }
}

/// HTTP service over a [`Proxy`].
///
/// One service is built at startup; the server derives a per-connection copy
/// with [`ProxyHttpService::for_peer`] so access logs carry the client address.
pub struct ProxyHttpService<B: ObjectBackend + ?Sized> {
    proxy: Proxy<B>,
    config: Arc<ProxyHttpConfig>,
    peer_addr: Option<SocketAddr>,
}

impl<B: ObjectBackend + ?Sized> ProxyHttpService<B> {
    /// Create a service with the given proxy and configuration.
    #[must_use]
    pub fn new(proxy: Proxy<B>, config: ProxyHttpConfig) -> Self {
        Self {
            proxy,
            config: Arc::new(config),
            peer_addr: None,
        }
    }

    /// A copy of this service for a connection from `peer_addr`.
    #[must_use]
    pub fn for_peer(&self, peer_addr: SocketAddr) -> Self {
        Self {
            peer_addr: Some(peer_addr),
            ..self.clone()
        }
    }

    /// The HTTP configuration.
    #[must_use]
    pub fn config(&self) -> &ProxyHttpConfig {
        &self.config
    }

    /// The wrapped proxy.
    #[must_use]
    pub fn proxy(&self) -> &Proxy<B> {
        &self.proxy
    }
}

impl<B: ObjectBackend + ?Sized> Clone for ProxyHttpService<B> {
    fn clone(&self) -> Self {
        Self {
            proxy: self.proxy.clone(),
            config: Arc::clone(&self.config),
            peer_addr: self.peer_addr,
        }
    }
}

impl<B: ObjectBackend + ?Sized> fmt::Debug for ProxyHttpService<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyHttpService")
            .field("proxy", &self.proxy)
            .field("config", &self.config)
            .field("peer_addr", &self.peer_addr)
            .finish()
    }
}

impl<B, T> Service<http::Request<T>> for ProxyHttpService<B>
where
    B: ObjectBackend + ?Sized,
    T: Send + 'static,
{
    type Response = Response<ProxyBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<T>) -> Self::Future {
        let proxy = self.proxy.clone();
        let config = Arc::clone(&self.config);
        let peer_addr = self.peer_addr;

        Box::pin(async move {
            let started = Instant::now();
            // The request body is never read.
            let (parts, _body) = req.into_parts();

            let response = process_request(&proxy, &parts).await;

            if config.log_requests {
                log_access(peer_addr, &parts, &response, started.elapsed());
            }

            Ok(response)
        })
    }
}

/// Run one request through the proxy pipeline.
async fn process_request<B: ObjectBackend + ?Sized>(
    proxy: &Proxy<B>,
    parts: &Parts,
) -> Response<ProxyBody> {
    let head_only = match parts.method {
        Method::GET => false,
        Method::HEAD => true,
        _ => {
            debug!(method = %parts.method, uri = %parts.uri, "method not allowed");
            return method_not_allowed_response();
        }
    };

    let if_none_match = header_str(&parts.headers, &IF_NONE_MATCH).map(ToOwned::to_owned);
    let outcome = match proxy.resolve(parts.uri.path(), if_none_match) {
        Ok(ctx) => proxy.handle(&ctx).await,
        Err(err) => {
            debug!(path = parts.uri.path(), error = %err, "request outside mount prefix");
            Err(err)
        }
    };

    let response = proxy_response(outcome);
    if head_only {
        // Dropping the object stream releases the backend response.
        response.map(|_| ProxyBody::empty())
    } else {
        response
    }
}

fn log_access(
    peer_addr: Option<SocketAddr>,
    parts: &Parts,
    response: &Response<ProxyBody>,
    elapsed: Duration,
) {
    let peer = peer_addr.map_or_else(|| "-".to_owned(), |addr| addr.to_string());
    info!(
        target: ACCESS_LOG_TARGET,
        peer = %peer,
        method = %parts.method,
        path = parts.uri.path(),
        status = response.status().as_u16(),
        user_agent = header_str(&parts.headers, &USER_AGENT).unwrap_or("-"),
        referer = header_str(&parts.headers, &REFERER).unwrap_or("-"),
        elapsed = ?elapsed,
        "request"
    );
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
