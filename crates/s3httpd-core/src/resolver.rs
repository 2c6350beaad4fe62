//! Path resolution: request path -> listing or object key.
//!
//! Resolution rules, in order:
//!
//! 1. With a prefix configured, the path must be `/<prefix>` or start with
//!    `/<prefix>/`. Anything else is a [`ProxyError::RoutingMismatch`] and never
//!    reaches the backend.
//! 2. The prefix and a single leading `/` are stripped, yielding the key.
//! 3. An empty key lists the whole bucket.
//! 4. Without a prefix, a key ending in `/` resolves to its `index.html`.
//! 5. Otherwise the key is used verbatim. Segments such as `..` are passed
//!    through untouched; keys are never joined as filesystem paths.

use percent_encoding::percent_decode_str;

use crate::error::ProxyError;

/// Document served for directory-style keys.
pub const INDEX_DOCUMENT: &str = "index.html";

/// What a request resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Render the bucket index.
    Listing,
    /// Fetch the object with this key.
    Object(String),
}

/// Per-request state derived from the inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// The request path as received, before percent-decoding.
    pub raw_path: String,
    /// The resolved listing marker or object key.
    pub target: Target,
    /// The `If-None-Match` header value, if the client sent a non-empty one.
    pub if_none_match: Option<String>,
}

impl RequestContext {
    /// Decode `raw_path` and resolve it against `prefix`.
    ///
    /// # Examples
    ///
    /// ```
    /// use s3httpd_core::{RequestContext, Target};
    ///
    /// let ctx = RequestContext::resolve("/files/a%20b.txt", None, "files").unwrap();
    /// assert_eq!(ctx.target, Target::Object("a b.txt".to_owned()));
    /// ```
    pub fn resolve(
        raw_path: &str,
        if_none_match: Option<String>,
        prefix: &str,
    ) -> Result<Self, ProxyError> {
        let path = decode_path(raw_path);
        let target = resolve_path(&path, prefix)?;
        Ok(Self {
            raw_path: raw_path.to_owned(),
            target,
            if_none_match: if_none_match.filter(|v| !v.is_empty()),
        })
    }
}

/// Percent-decode a URL path. Invalid UTF-8 is replaced lossily.
#[must_use]
pub fn decode_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Resolve a decoded path against a normalized prefix (no surrounding slashes).
pub fn resolve_path(path: &str, prefix: &str) -> Result<Target, ProxyError> {
    let rest = if prefix.is_empty() {
        path
    } else {
        strip_mount_prefix(path, prefix).ok_or_else(|| ProxyError::RoutingMismatch {
            path: path.to_owned(),
            prefix: prefix.to_owned(),
        })?
    };

    let key = rest.strip_prefix('/').unwrap_or(rest);

    if key.is_empty() {
        return Ok(Target::Listing);
    }

    if prefix.is_empty() && key.ends_with('/') {
        return Ok(Target::Object(format!("{key}{INDEX_DOCUMENT}")));
    }

    Ok(Target::Object(key.to_owned()))
}

/// Strip `/<prefix>` from `path` on a segment boundary.
fn strip_mount_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix('/')?.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}
