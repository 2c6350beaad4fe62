//! Object-storage backend abstraction.
//!
//! The proxy needs exactly two capabilities from storage: listing the keys of a
//! bucket and fetching a single object with an optional `If-None-Match`
//! condition. [`ObjectBackend`] captures those; [`s3::S3Backend`] implements it
//! over `aws-sdk-s3` and [`memory::MemoryBackend`] keeps objects in process.
//!
//! # Object safety
//!
//! The trait uses `#[async_trait]` so it can be used as `Arc<dyn ObjectBackend>`.

pub mod memory;
pub mod s3;

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use futures::stream::{self, BoxStream};

use crate::error::BackendError;

pub use memory::{MemoryBackend, MemoryObject};
pub use s3::S3Backend;

/// Storage operations used by the proxy.
#[async_trait::async_trait]
pub trait ObjectBackend: Send + Sync + 'static {
    /// List the keys in `bucket`, in backend order.
    ///
    /// A single call is issued; truncated results are not followed.
    async fn list_objects(&self, bucket: &str) -> Result<Vec<ListingEntry>, BackendError>;

    /// Fetch `key` from `bucket`.
    ///
    /// When `if_none_match` is given and matches the object's ETag, the backend
    /// reports [`BackendErrorCode::NotModified`](crate::BackendErrorCode::NotModified).
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        if_none_match: Option<&str>,
    ) -> Result<ObjectDescriptor, BackendError>;
}

/// One key returned by a listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// The object key.
    pub key: String,
}

impl ListingEntry {
    /// Create an entry for `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// A successfully fetched object.
#[derive(Debug)]
pub struct ObjectDescriptor {
    /// Size of the body in bytes, when the backend reports it.
    pub content_length: Option<u64>,
    /// Content type stored with the object.
    pub content_type: Option<String>,
    /// Entity tag of the object, verbatim (quotes included).
    pub etag: Option<String>,
    /// The object bytes.
    pub body: ObjectBody,
}

/// Streaming object body.
///
/// The underlying backend resource is released when the body is dropped,
/// whether or not it was read to the end.
pub struct ObjectBody {
    inner: BoxStream<'static, Result<Bytes, std::io::Error>>,
}

impl ObjectBody {
    /// Wrap a stream of byte chunks.
    #[must_use]
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// A body holding a single buffered chunk.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        if data.is_empty() {
            return Self::empty();
        }
        Self::from_stream(stream::once(async move { Ok(data) }))
    }

    /// An empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_stream(stream::empty())
    }
}

impl fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBody").finish_non_exhaustive()
    }
}

impl Stream for ObjectBody {
    type Item = Result<Bytes, std::io::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
