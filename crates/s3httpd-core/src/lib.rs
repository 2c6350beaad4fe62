//! Request translation core for s3httpd.
//!
//! This crate holds every decision the proxy makes about a request, independent
//! of the HTTP server it runs in:
//!
//! - **Configuration** ([`config`]): the immutable [`ProxyConfig`] shared by all
//!   requests.
//! - **Path resolution** ([`resolver`]): maps a request path (optionally under a
//!   mount prefix) to either a bucket listing or an object key.
//! - **Listing** ([`listing`]): renders the HTML index of the bucket.
//! - **Fetching** ([`fetch`]): retrieves an object and derives its response
//!   headers (content type, ETag, length, disposition).
//! - **Error mapping** ([`mapper`]): classifies backend failures into
//!   [`ProxyError`]s and logs them.
//! - **Backends** ([`backend`]): the [`ObjectBackend`] trait plus an
//!   `aws-sdk-s3` adapter and an in-memory implementation.
//!
//! # Architecture
//!
//! ```text
//! raw path + If-None-Match
//!   -> RequestContext::resolve (prefix check, key derivation)
//!     -> Target::Listing   -> listing::list_bucket -> ListingPage
//!     -> Target::Object(k) -> fetch::fetch_object  -> FetchedObject
//!   <- ProxyError (mapped by mapper::classify) on failure
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod fetch;
pub mod listing;
pub mod mapper;
pub mod proxy;
pub mod resolver;

pub use backend::{ListingEntry, ObjectBackend, ObjectBody, ObjectDescriptor};
pub use config::{ConfigError, ProxyConfig};
pub use error::{BackendError, BackendErrorCode, ErrorStatus, Operation, ProxyError};
pub use fetch::{FetchedObject, ObjectHeaders};
pub use listing::ListingPage;
pub use proxy::{Proxy, ProxyResponse};
pub use resolver::{RequestContext, Target};
