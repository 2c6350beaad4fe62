//! HTTP layer for s3httpd.
//!
//! This crate turns the protocol-neutral outcomes of `s3httpd-core` into hyper
//! responses and runs the server:
//!
//! - **Body** ([`body`]): [`ProxyBody`], supporting buffered, streaming and
//!   empty responses.
//! - **Writer** ([`writer`]): [`ResponseWriter`], an explicit
//!   `Unsent -> HeadersSent -> Closed` state machine that rejects header
//!   changes once the response is committed.
//! - **Responses** ([`response`]): listing, object, 304 and plain-text error
//!   responses.
//! - **Service** ([`service`]): [`ProxyHttpService`], the hyper `Service`
//!   with optional access logging.
//! - **Server** ([`server`]): the accept loop with graceful shutdown.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> ProxyHttpService (hyper Service)
//!     -> method check (GET / HEAD)
//!     -> Proxy::resolve (prefix + key)
//!     -> Proxy::handle (listing or object fetch)
//!     -> response::* via ResponseWriter
//!     -> access log line
//!   <- HTTP Response
//! ```

pub mod body;
pub mod response;
pub mod server;
pub mod service;
pub mod writer;

pub use body::ProxyBody;
pub use server::serve;
pub use service::{ProxyHttpConfig, ProxyHttpService};
pub use writer::{ResponseWriter, WriterError, WriterState};
