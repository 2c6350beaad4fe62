//! Backend error classification.
//!
//! Every backend failure goes through [`classify`] at the call site. Absence
//! and conditional matches are expected outcomes and only logged at debug
//! level; everything else is logged as an error with the operation, bucket and
//! key. Nothing is retried here.

use tracing::{debug, error};

use crate::error::{BackendError, BackendErrorCode, Operation, ProxyError};

/// Classify a backend failure for `operation` on `bucket` / `key`.
///
/// Only [`Operation::GetObject`] has a not-found or not-modified outcome; a
/// listing failure is always an internal error.
#[must_use]
pub fn classify(
    operation: Operation,
    bucket: &str,
    key: Option<&str>,
    err: BackendError,
) -> ProxyError {
    match err {
        BackendError::Service {
            code: BackendErrorCode::NoSuchKey,
            ..
        } if operation == Operation::GetObject => {
            debug!(%operation, bucket, key, "object not found");
            ProxyError::NotFound {
                key: key.unwrap_or_default().to_owned(),
            }
        }
        BackendError::Service {
            code: BackendErrorCode::NotModified,
            ..
        } if operation == Operation::GetObject => {
            debug!(%operation, bucket, key, "object not modified");
            ProxyError::NotModified {
                key: key.unwrap_or_default().to_owned(),
                etag: None,
            }
        }
        BackendError::Service { code, message } => {
            error!(%operation, bucket, key, code = %code, message = %message, "backend error");
            ProxyError::Backend {
                operation,
                bucket: bucket.to_owned(),
                key: key.map(ToOwned::to_owned),
                code,
                message,
            }
        }
        BackendError::Transport(message) => {
            error!(%operation, bucket, key, error = %message, "unknown backend error");
            ProxyError::Transport {
                operation,
                bucket: bucket.to_owned(),
                key: key.map(ToOwned::to_owned),
                message,
            }
        }
    }
}
