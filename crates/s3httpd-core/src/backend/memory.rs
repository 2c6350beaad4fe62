//! In-process [`ObjectBackend`].
//!
//! Holds a fixed set of objects in insertion order. Used by the test suites and
//! for running the proxy without an S3 endpoint. Every call increments a
//! counter so callers can assert whether storage was touched at all.

use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use futures::stream;

use super::{ListingEntry, ObjectBackend, ObjectBody, ObjectDescriptor};
use crate::error::{BackendError, BackendErrorCode};

/// An object stored in a [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryObject {
    /// Object key.
    pub key: String,
    /// Object bytes.
    pub data: Bytes,
    /// Stored content type.
    pub content_type: Option<String>,
    /// Stored ETag, verbatim.
    pub etag: Option<String>,
    /// When set, the body fails with an I/O error after yielding this many bytes.
    pub fail_after: Option<usize>,
}

impl MemoryObject {
    /// An object with no content type and no ETag.
    #[must_use]
    pub fn new(key: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            data: data.into(),
            content_type: None,
            etag: None,
            fail_after: None,
        }
    }

    /// Set the stored content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the stored ETag.
    #[must_use]
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    /// Make the body fail after `bytes` bytes have been yielded.
    #[must_use]
    pub fn failing_after(mut self, bytes: usize) -> Self {
        self.fail_after = Some(bytes);
        self
    }

    fn body(&self) -> ObjectBody {
        match self.fail_after {
            None => ObjectBody::from_bytes(self.data.clone()),
            Some(n) => {
                let head = self.data.slice(..n.min(self.data.len()));
                ObjectBody::from_stream(stream::iter(vec![
                    Ok(head),
                    Err(std::io::Error::other("simulated body failure")),
                ]))
            }
        }
    }
}

/// Object backend backed by a vector of [`MemoryObject`]s.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    objects: Vec<MemoryObject>,
    failure: Option<BackendError>,
    calls: AtomicUsize,
}

impl MemoryBackend {
    /// An empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object. Keys are listed in the order they were added.
    #[must_use]
    pub fn with_object(mut self, object: MemoryObject) -> Self {
        self.objects.push(object);
        self
    }

    /// Make every call fail with `error`.
    #[must_use]
    pub fn failing_with(mut self, error: BackendError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Number of backend calls served so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn record_call(&self) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl ObjectBackend for MemoryBackend {
    async fn list_objects(&self, _bucket: &str) -> Result<Vec<ListingEntry>, BackendError> {
        self.record_call()?;
        Ok(self
            .objects
            .iter()
            .map(|object| ListingEntry::new(object.key.clone()))
            .collect())
    }

    async fn get_object(
        &self,
        _bucket: &str,
        key: &str,
        if_none_match: Option<&str>,
    ) -> Result<ObjectDescriptor, BackendError> {
        self.record_call()?;

        let object = self
            .objects
            .iter()
            .find(|object| object.key == key)
            .ok_or_else(|| {
                BackendError::service(
                    BackendErrorCode::NoSuchKey,
                    "The specified key does not exist.",
                )
            })?;

        if let (Some(condition), Some(etag)) = (if_none_match, object.etag.as_deref()) {
            if etag_matches(condition, etag) {
                return Err(BackendError::service(
                    BackendErrorCode::NotModified,
                    "Not Modified",
                ));
            }
        }

        Ok(ObjectDescriptor {
            content_length: Some(object.data.len() as u64),
            content_type: object.content_type.clone(),
            etag: object.etag.clone(),
            body: object.body(),
        })
    }
}

/// Weak `If-None-Match` comparison: `*`, or any listed tag equal to `etag`
/// once `W/` prefixes are ignored.
fn etag_matches(condition: &str, etag: &str) -> bool {
    let etag = etag.trim_start_matches("W/");
    condition
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == etag)
}
