//! Response writer with explicit commit semantics.
//!
//! A [`ResponseWriter`] moves through three states:
//!
//! ```text
//! Unsent --write_head--> HeadersSent --write_body--> Closed
//! ```
//!
//! Headers may only be changed while `Unsent`. Writing a body on an `Unsent`
//! writer commits the head first with the current status, mirroring servers
//! that send headers on the first body write.

use http::header::{CONTENT_TYPE, HeaderName, HeaderValue, X_CONTENT_TYPE_OPTIONS};
use http::{HeaderMap, Response, StatusCode};

use crate::body::ProxyBody;

/// Where a [`ResponseWriter`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Status and headers can still change.
    Unsent,
    /// Status and headers are committed.
    HeadersSent,
    /// The body has been written.
    Closed,
}

/// Rejected writer operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriterError {
    /// Status or headers were changed after the head was committed.
    #[error("response headers already sent")]
    HeadersAlreadySent,
    /// A body was written twice.
    #[error("response already closed")]
    Closed,
    /// The header value contains bytes not allowed in HTTP headers.
    #[error("invalid value for header {name}")]
    InvalidHeader {
        /// The header name.
        name: HeaderName,
    },
}

/// Builds one response, enforcing `Unsent -> HeadersSent -> Closed`.
#[derive(Debug)]
pub struct ResponseWriter {
    state: WriterState,
    status: StatusCode,
    headers: HeaderMap,
    body: ProxyBody,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseWriter {
    /// A fresh writer with status `200 OK` and no headers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: WriterState::Unsent,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: ProxyBody::empty(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Headers set so far.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Set `name` to `value`, replacing any previous value.
    pub fn set_header(&mut self, name: HeaderName, value: &str) -> Result<(), WriterError> {
        if self.state != WriterState::Unsent {
            return Err(WriterError::HeadersAlreadySent);
        }
        let value = HeaderValue::from_str(value).map_err(|_| WriterError::InvalidHeader {
            name: name.clone(),
        })?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Commit `status` and the current headers.
    pub fn write_head(&mut self, status: StatusCode) -> Result<(), WriterError> {
        match self.state {
            WriterState::Unsent => {
                self.status = status;
                self.state = WriterState::HeadersSent;
                Ok(())
            }
            WriterState::HeadersSent => Err(WriterError::HeadersAlreadySent),
            WriterState::Closed => Err(WriterError::Closed),
        }
    }

    /// Write the body, committing the head first if needed.
    pub fn write_body(&mut self, body: ProxyBody) -> Result<(), WriterError> {
        match self.state {
            WriterState::Unsent | WriterState::HeadersSent => {
                self.state = WriterState::Closed;
                self.body = body;
                Ok(())
            }
            WriterState::Closed => Err(WriterError::Closed),
        }
    }

    /// Convert into the finished response.
    ///
    /// An `Unsent` writer is committed with its current status and an empty body.
    #[must_use]
    pub fn finish(self) -> Response<ProxyBody> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }

    /// Finish with a plain-text body: `message` followed by a newline.
    pub fn write_plain(
        mut self,
        status: StatusCode,
        message: &str,
    ) -> Result<Response<ProxyBody>, WriterError> {
        self.set_header(CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.as_ref())?;
        self.set_header(X_CONTENT_TYPE_OPTIONS, "nosniff")?;
        self.write_head(status)?;
        self.write_body(ProxyBody::from_string(format!("{message}\n")))?;
        Ok(self.finish())
    }

    /// Plain-text error response on a fresh writer.
    pub fn plain_error(
        status: StatusCode,
        message: &str,
    ) -> Result<Response<ProxyBody>, WriterError> {
        Self::new().write_plain(status, message)
    }

    /// Bare `500` used when building a response itself failed.
    #[must_use]
    pub fn internal_error() -> Response<ProxyBody> {
        let mut response = Response::new(ProxyBody::from_string("Internal Error\n"));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
            .headers_mut()
            .insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        response
    }
}
