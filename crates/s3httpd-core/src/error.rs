//! Error types for backend calls and request handling.
//!
//! [`BackendError`] is what an [`ObjectBackend`](crate::ObjectBackend) returns:
//! either a typed service error carrying a [`BackendErrorCode`], or an opaque
//! transport failure. [`ProxyError`] is the request-level taxonomy that the
//! HTTP layer turns into a status line via [`ProxyError::status`].

use std::fmt;

use http::StatusCode;

/// A backend operation issued by the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// List the keys of the bucket.
    ListObjects,
    /// Fetch a single object.
    GetObject,
}

impl Operation {
    /// Returns the operation name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListObjects => "ListObjects",
            Self::GetObject => "GetObject",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error codes the proxy recognizes from the storage backend.
///
/// Anything not listed here is kept verbatim in [`BackendErrorCode::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BackendErrorCode {
    /// The requested key does not exist.
    NoSuchKey,
    /// The conditional request matched the current ETag.
    NotModified,
    /// The bucket does not exist.
    NoSuchBucket,
    /// The backend refused the proxy's credentials.
    AccessDenied,
    /// Any other backend error code.
    Other(String),
}

impl BackendErrorCode {
    /// Parse a backend error code string.
    ///
    /// # Examples
    ///
    /// ```
    /// use s3httpd_core::BackendErrorCode;
    ///
    /// assert_eq!(BackendErrorCode::from_code("NoSuchKey"), BackendErrorCode::NoSuchKey);
    /// assert_eq!(
    ///     BackendErrorCode::from_code("SlowDown"),
    ///     BackendErrorCode::Other("SlowDown".to_owned()),
    /// );
    /// ```
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "NoSuchKey" => Self::NoSuchKey,
            "NotModified" => Self::NotModified,
            "NoSuchBucket" => Self::NoSuchBucket,
            "AccessDenied" => Self::AccessDenied,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns the error code as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NoSuchKey => "NoSuchKey",
            Self::NotModified => "NotModified",
            Self::NoSuchBucket => "NoSuchBucket",
            Self::AccessDenied => "AccessDenied",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for BackendErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by an object-storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The backend answered with a typed error.
    #[error("{code}: {message}")]
    Service {
        /// Machine-readable error code.
        code: BackendErrorCode,
        /// Human-readable detail from the backend.
        message: String,
    },

    /// The backend could not be reached or answered with something unrecognizable.
    #[error("transport error: {0}")]
    Transport(String),
}

impl BackendError {
    /// Create a typed service error.
    #[must_use]
    pub fn service(code: BackendErrorCode, message: impl Into<String>) -> Self {
        Self::Service {
            code,
            message: message.into(),
        }
    }

    /// Create a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// The backend error code, if this is a typed service error.
    #[must_use]
    pub fn code(&self) -> Option<&BackendErrorCode> {
        match self {
            Self::Service { code, .. } => Some(code),
            Self::Transport(_) => None,
        }
    }
}

/// Client-facing outcome of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    /// 404.
    NotFound,
    /// 304, not an error for the client.
    NotModified,
    /// 500.
    InternalError,
}

impl ErrorStatus {
    /// HTTP status code for this outcome.
    #[must_use]
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::NotModified => StatusCode::NOT_MODIFIED,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Request-level error.
///
/// The `Display` output is meant for logs and may contain backend detail.
/// Clients only ever see [`ProxyError::client_message`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyError {
    /// The request path is not under the configured prefix.
    #[error("path {path} is outside prefix /{prefix}")]
    RoutingMismatch {
        /// The request path.
        path: String,
        /// The configured prefix.
        prefix: String,
    },

    /// The key does not exist in the bucket.
    #[error("no such key: {key}")]
    NotFound {
        /// The missing key.
        key: String,
    },

    /// The conditional request matched; the client copy is current.
    #[error("not modified: {key}")]
    NotModified {
        /// The requested key.
        key: String,
        /// Entity tag echoed on the `304`, when the client sent a single one.
        etag: Option<String>,
    },

    /// The backend reported a fault other than absence.
    #[error("{operation} on bucket {bucket} key {key:?} failed with {code}: {message}")]
    Backend {
        /// The failed operation.
        operation: Operation,
        /// The bucket involved.
        bucket: String,
        /// The key involved, if any.
        key: Option<String>,
        /// The backend error code.
        code: BackendErrorCode,
        /// Backend detail.
        message: String,
    },

    /// The backend was unreachable or answered in an unrecognized shape.
    #[error("{operation} on bucket {bucket} key {key:?} failed: {message}")]
    Transport {
        /// The failed operation.
        operation: Operation,
        /// The bucket involved.
        bucket: String,
        /// The key involved, if any.
        key: Option<String>,
        /// Transport detail.
        message: String,
    },

    /// Copying the object body failed after the response was committed.
    #[error("streaming {key} failed: {message}")]
    Streaming {
        /// The key being streamed.
        key: String,
        /// I/O detail.
        message: String,
    },
}

impl ProxyError {
    /// Client-facing outcome of this error.
    #[must_use]
    pub fn status(&self) -> ErrorStatus {
        match self {
            Self::RoutingMismatch { .. } | Self::NotFound { .. } => ErrorStatus::NotFound,
            Self::NotModified { .. } => ErrorStatus::NotModified,
            Self::Backend { .. } | Self::Transport { .. } | Self::Streaming { .. } => {
                ErrorStatus::InternalError
            }
        }
    }

    /// Short plain-text message safe to show to clients.
    #[must_use]
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::RoutingMismatch { .. } => "Not Found",
            Self::NotFound { .. } => "File Not Found",
            Self::NotModified { .. } => "",
            Self::Backend { .. } | Self::Transport { .. } | Self::Streaming { .. } => {
                "Internal Error"
            }
        }
    }
}
