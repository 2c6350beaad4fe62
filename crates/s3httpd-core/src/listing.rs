//! Bucket index page.
//!
//! The listing always covers the whole bucket, even when the proxy is mounted
//! under a prefix; the prefix only affects the generated links so that they
//! route back through the resolver.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::backend::{ListingEntry, ObjectBackend};
use crate::error::{Operation, ProxyError};
use crate::mapper::classify;

/// Bytes percent-encoded in listing links. Unreserved characters and the `/`
/// separator are kept; everything the resolver would decode or a browser
/// would treat as a query, fragment or scheme delimiter is escaped.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// A rendered bucket index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// The HTML document.
    pub html: String,
    /// Number of keys listed.
    pub entries: usize,
}

/// List `bucket` and render the index page.
pub async fn list_bucket<B>(backend: &B, bucket: &str, prefix: &str) -> Result<ListingPage, ProxyError>
where
    B: ObjectBackend + ?Sized,
{
    let entries = backend
        .list_objects(bucket)
        .await
        .map_err(|err| classify(Operation::ListObjects, bucket, None, err))?;

    Ok(ListingPage {
        html: render_listing(bucket, prefix, &entries),
        entries: entries.len(),
    })
}

/// Render the index page for `entries`, preserving their order.
///
/// # Examples
///
/// ```
/// use s3httpd_core::ListingEntry;
/// use s3httpd_core::listing::render_listing;
///
/// let html = render_listing("demo", "files", &[ListingEntry::new("a.txt")]);
/// assert!(html.contains(r#"<li><a href="/files/a.txt">a.txt</a></li>"#));
/// ```
#[must_use]
pub fn render_listing(bucket: &str, prefix: &str, entries: &[ListingEntry]) -> String {
    let mut html = format!(
        "<html><body><h1>Contents of Bucket {}</h1><ul>",
        html_escape(bucket)
    );
    for entry in entries {
        let href = link_target(prefix, &entry.key);
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>",
            html_escape(&href),
            html_escape(&entry.key)
        ));
    }
    html.push_str("</ul></body></html>");
    html
}

/// Link for `key`: `/<prefix>/<key>` when mounted under a prefix, the bare key otherwise.
///
/// The key is percent-encoded so that decoding the request path yields it
/// back unchanged. Without a prefix the link is relative to `/`, so a leading
/// `/` in the key is encoded to keep the link from becoming absolute.
fn link_target(prefix: &str, key: &str) -> String {
    let encoded = utf8_percent_encode(key, KEY_ENCODE_SET).to_string();
    if !prefix.is_empty() {
        let prefix = utf8_percent_encode(prefix, KEY_ENCODE_SET);
        return format!("/{prefix}/{encoded}");
    }
    match encoded.strip_prefix('/') {
        Some(rest) => format!("%2F{rest}"),
        None => encoded,
    }
}

/// Escape `<`, `>`, `&`, `'` and `"` for HTML text and attribute values.
#[must_use]
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
