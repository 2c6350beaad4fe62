//! Object fetch and response header derivation.
//!
//! Header rules for a successful fetch:
//!
//! - `Content-Type`: the stored type when non-empty, else a guess from the key's
//!   extension, else `application/octet-stream`.
//! - `ETag`: the stored ETag when non-empty.
//! - `Content-Length`: the stored size when known.
//! - `Content-Disposition`: always `attachment; filename="<basename>"`, so bucket
//!   content is downloaded rather than rendered against the proxy's origin.

use crate::backend::{ObjectBackend, ObjectBody, ObjectDescriptor};
use crate::error::{Operation, ProxyError};
use crate::mapper::classify;

/// Headers derived for a fetched object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHeaders {
    /// Resolved content type.
    pub content_type: String,
    /// Body size, when known.
    pub content_length: Option<u64>,
    /// Entity tag, when the backend reported a non-empty one.
    pub etag: Option<String>,
    /// `Content-Disposition` value.
    pub content_disposition: String,
}

impl ObjectHeaders {
    /// Derive response headers for `key` from the backend's descriptor.
    #[must_use]
    pub fn resolve(
        key: &str,
        content_type: Option<&str>,
        content_length: Option<u64>,
        etag: Option<&str>,
    ) -> Self {
        Self {
            content_type: resolve_content_type(key, content_type),
            content_length,
            etag: etag.filter(|e| !e.is_empty()).map(ToOwned::to_owned),
            content_disposition: content_disposition(key),
        }
    }
}

/// A fetched object ready to be streamed.
#[derive(Debug)]
pub struct FetchedObject {
    /// The object key.
    pub key: String,
    /// Response headers.
    pub headers: ObjectHeaders,
    /// The object bytes.
    pub body: ObjectBody,
}

/// Fetch `key` from `bucket`, passing `if_none_match` through.
pub async fn fetch_object<B>(
    backend: &B,
    bucket: &str,
    key: &str,
    if_none_match: Option<&str>,
) -> Result<FetchedObject, ProxyError>
where
    B: ObjectBackend + ?Sized,
{
    let ObjectDescriptor {
        content_length,
        content_type,
        etag,
        body,
    } = backend
        .get_object(bucket, key, if_none_match)
        .await
        .map_err(|err| match classify(Operation::GetObject, bucket, Some(key), err) {
            ProxyError::NotModified { key, .. } => ProxyError::NotModified {
                key,
                etag: if_none_match.and_then(single_entity_tag),
            },
            other => other,
        })?;

    Ok(FetchedObject {
        key: key.to_owned(),
        headers: ObjectHeaders::resolve(
            key,
            content_type.as_deref(),
            content_length,
            etag.as_deref(),
        ),
        body,
    })
}

/// The entity tag in an `If-None-Match` value, when it names exactly one.
///
/// `*` and tag lists match without identifying a validator, so nothing is
/// echoed for them.
#[must_use]
pub fn single_entity_tag(if_none_match: &str) -> Option<String> {
    let tag = if_none_match.trim();
    (!tag.is_empty() && tag != "*" && !tag.contains(',')).then(|| tag.to_owned())
}

/// Resolve the content type for `key`.
///
/// # Examples
///
/// ```
/// use s3httpd_core::fetch::resolve_content_type;
///
/// assert_eq!(resolve_content_type("a.css", None), "text/css");
/// assert_eq!(resolve_content_type("a.css", Some("text/x-custom")), "text/x-custom");
/// assert_eq!(resolve_content_type("blob", Some("")), "application/octet-stream");
/// ```
#[must_use]
pub fn resolve_content_type(key: &str, reported: Option<&str>) -> String {
    match reported.map(str::trim).filter(|t| !t.is_empty()) {
        Some(content_type) => content_type.to_owned(),
        None => mime_guess::from_path(basename(key))
            .first_or_octet_stream()
            .to_string(),
    }
}

/// Last `/`-separated segment of `key`, ignoring trailing slashes.
///
/// A key made only of slashes yields `/`.
#[must_use]
pub fn basename(key: &str) -> &str {
    let trimmed = key.trim_end_matches('/');
    if trimmed.is_empty() {
        return if key.is_empty() { "." } else { "/" };
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// `Content-Disposition` value forcing download of `key`.
///
/// Quotes and backslashes in the filename are escaped and control characters
/// are percent-encoded, so the value is always a valid header.
#[must_use]
pub fn content_disposition(key: &str) -> String {
    let mut filename = String::new();
    for ch in basename(key).chars() {
        match ch {
            '"' | '\\' => {
                filename.push('\\');
                filename.push(ch);
            }
            c if c.is_control() => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    filename.push_str(&format!("%{byte:02X}"));
                }
            }
            c => filename.push(c),
        }
    }
    format!("attachment; filename=\"{filename}\"")
}
