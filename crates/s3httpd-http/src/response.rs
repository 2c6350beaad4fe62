//! Proxy outcome to HTTP response serialization.
//!
//! Response categories:
//! - **Listing**: `200` with an HTML body.
//! - **Object**: `200` with object headers and a streaming body.
//! - **Not modified**: `304` with no body.
//! - **Errors**: `404`, `405` and `500` with a short plain-text body.

use http::header::{ALLOW, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, ETAG, HeaderName};
use http::{Response, StatusCode};
use tracing::{error, warn};

use s3httpd_core::{ErrorStatus, FetchedObject, ListingPage, ProxyError, ProxyResponse};

use crate::body::ProxyBody;
use crate::writer::{ResponseWriter, WriterError};

/// Methods the proxy answers.
pub const ALLOWED_METHODS: &str = "GET, HEAD";

/// Convert a handler outcome into a response.
#[must_use]
pub fn proxy_response(outcome: Result<ProxyResponse, ProxyError>) -> Response<ProxyBody> {
    match outcome {
        Ok(ProxyResponse::Listing(page)) => listing_response(page),
        Ok(ProxyResponse::Object(object)) => object_response(object),
        Err(err) => error_response(&err),
    }
}

/// `200` listing page.
#[must_use]
pub fn listing_response(page: ListingPage) -> Response<ProxyBody> {
    or_internal_error(build_listing(page))
}

/// `200` object response with a streaming body.
#[must_use]
pub fn object_response(object: FetchedObject) -> Response<ProxyBody> {
    or_internal_error(build_object(object))
}

/// Error response for `err`; a `304` carries no body and echoes the matched `ETag`.
#[must_use]
pub fn error_response(err: &ProxyError) -> Response<ProxyBody> {
    let status = err.status();
    let built = match status {
        ErrorStatus::NotModified => build_not_modified(err),
        ErrorStatus::NotFound | ErrorStatus::InternalError => {
            ResponseWriter::plain_error(status.status_code(), err.client_message())
        }
    };
    or_internal_error(built)
}

/// `405` for anything other than `GET` and `HEAD`.
#[must_use]
pub fn method_not_allowed_response() -> Response<ProxyBody> {
    or_internal_error(build_method_not_allowed())
}

fn build_method_not_allowed() -> Result<Response<ProxyBody>, WriterError> {
    let mut writer = ResponseWriter::new();
    writer.set_header(ALLOW, ALLOWED_METHODS)?;
    writer.write_plain(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

fn build_listing(page: ListingPage) -> Result<Response<ProxyBody>, WriterError> {
    let mut writer = ResponseWriter::new();
    writer.set_header(CONTENT_TYPE, mime::TEXT_HTML_UTF_8.as_ref())?;
    writer.set_header(CONTENT_LENGTH, &page.html.len().to_string())?;
    writer.write_head(StatusCode::OK)?;
    writer.write_body(ProxyBody::from_string(page.html))?;
    Ok(writer.finish())
}

fn build_object(object: FetchedObject) -> Result<Response<ProxyBody>, WriterError> {
    let FetchedObject { key, headers, body } = object;
    let mut writer = ResponseWriter::new();

    set_or_skip(&mut writer, CONTENT_TYPE, Some(&headers.content_type), &key)?;
    set_or_skip(&mut writer, ETAG, headers.etag.as_deref(), &key)?;
    if let Some(length) = headers.content_length {
        writer.set_header(CONTENT_LENGTH, &length.to_string())?;
    }
    set_or_skip(
        &mut writer,
        CONTENT_DISPOSITION,
        Some(&headers.content_disposition),
        &key,
    )?;

    writer.write_head(StatusCode::OK)?;
    writer.write_body(ProxyBody::streaming(key, headers.content_length, body))?;
    Ok(writer.finish())
}

fn build_not_modified(err: &ProxyError) -> Result<Response<ProxyBody>, WriterError> {
    let mut writer = ResponseWriter::new();
    if let ProxyError::NotModified { key, etag } = err {
        set_or_skip(&mut writer, ETAG, etag.as_deref(), key)?;
    }
    writer.write_head(StatusCode::NOT_MODIFIED)?;
    writer.write_body(ProxyBody::empty())?;
    Ok(writer.finish())
}

/// Set an optional header, skipping values that are not valid header bytes.
fn set_or_skip(
    writer: &mut ResponseWriter,
    name: HeaderName,
    value: Option<&str>,
    key: &str,
) -> Result<(), WriterError> {
    let Some(value) = value else {
        return Ok(());
    };
    match writer.set_header(name, value) {
        Err(WriterError::InvalidHeader { name }) => {
            warn!(key, header = %name, "skipping invalid response header value");
            Ok(())
        }
        other => other,
    }
}

fn or_internal_error(built: Result<Response<ProxyBody>, WriterError>) -> Response<ProxyBody> {
    built.unwrap_or_else(|err| {
        error!(error = %err, "failed to build response");
        ResponseWriter::internal_error()
    })
}
