//! Response body types supporting buffered, streaming and empty modes.
//!
//! - **Buffered**: listing pages and plain-text error bodies.
//! - **Streaming**: object contents, copied chunk by chunk from the backend.
//! - **Empty**: 304 responses and every `HEAD` response.
//!
//! A streaming body that fails part-way logs the failure and yields an error
//! frame, which makes hyper abort the connection. The status line is already on
//! the wire at that point, so there is nothing else to report to the client.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use http_body::{Frame, SizeHint};
use http_body_util::Full;
use tracing::warn;

use s3httpd_core::{ObjectBody, ProxyError};

/// Object contents being streamed to the client.
#[derive(Debug)]
pub struct ObjectStream {
    key: String,
    length: Option<u64>,
    sent: u64,
    inner: ObjectBody,
}

impl ObjectStream {
    /// Wrap `body` for `key`; `length` is the size reported by the backend.
    #[must_use]
    pub fn new(key: impl Into<String>, length: Option<u64>, body: ObjectBody) -> Self {
        Self {
            key: key.into(),
            length,
            sent: 0,
            inner: body,
        }
    }
}

/// Response body for every s3httpd response.
#[derive(Debug, Default)]
pub enum ProxyBody {
    /// Buffered body for listings and error messages.
    Buffered(Full<Bytes>),
    /// Object bytes copied from the backend.
    Streaming(ObjectStream),
    /// No body.
    #[default]
    Empty,
}

impl ProxyBody {
    /// Create a buffered body from a UTF-8 string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::Buffered(Full::new(Bytes::from(s.into())))
    }

    /// Create a streaming body for an object.
    #[must_use]
    pub fn streaming(key: impl Into<String>, length: Option<u64>, body: ObjectBody) -> Self {
        Self::Streaming(ObjectStream::new(key, length, body))
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }
}

impl http_body::Body for ProxyBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Streaming(stream) => match Pin::new(&mut stream.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    stream.sent += chunk.len() as u64;
                    Poll::Ready(Some(Ok(Frame::data(chunk))))
                }
                Poll::Ready(Some(Err(err))) => {
                    let failure = ProxyError::Streaming {
                        key: stream.key.clone(),
                        message: err.to_string(),
                    };
                    warn!(
                        key = %stream.key,
                        sent = stream.sent,
                        error = %failure,
                        "object body copy failed"
                    );
                    Poll::Ready(Some(Err(err)))
                }
                Poll::Ready(None) => Poll::Ready(None),
                Poll::Pending => Poll::Pending,
            },
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Streaming(stream) => stream.length == Some(0),
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Streaming(stream) => match stream.length {
                Some(length) => SizeHint::with_exact(length.saturating_sub(stream.sent)),
                None => SizeHint::default(),
            },
            Self::Empty => SizeHint::with_exact(0),
        }
    }
}
