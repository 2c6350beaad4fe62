//! [`ObjectBackend`] over `aws-sdk-s3`.
//!
//! SDK failures are classified once, here, into [`BackendError`]: service
//! errors keep their code, everything else (dispatch failures, timeouts,
//! unparseable responses) becomes [`BackendError::Transport`].

use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use futures::stream;
use tracing::{debug, info};

use super::{ListingEntry, ObjectBackend, ObjectBody, ObjectDescriptor};
use crate::config::ProxyConfig;
use crate::error::{BackendError, BackendErrorCode};

/// S3 backend sharing one SDK client across all requests.
///
/// The SDK client is internally reference-counted, so cloning the backend is
/// cheap and every clone talks through the same connection pool.
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: Client,
}

impl S3Backend {
    /// Wrap an existing SDK client.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the default credential chain and the proxy config.
    ///
    /// When `s3_endpoint` is set, requests go to that endpoint with path-style
    /// addressing (as MinIO and most S3-compatible servers expect).
    pub async fn from_config(config: &ProxyConfig) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = config.s3_endpoint.as_deref() {
            info!(endpoint, "using alternate S3 endpoint with path-style addressing");
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::from_client(Client::from_conf(builder.build()))
    }
}

#[async_trait::async_trait]
impl ObjectBackend for S3Backend {
    async fn list_objects(&self, bucket: &str) -> Result<Vec<ListingEntry>, BackendError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        if output.is_truncated() == Some(true) {
            debug!(bucket, "listing truncated, remaining keys omitted");
        }

        Ok(output
            .contents()
            .iter()
            .filter_map(|object| object.key())
            .map(ListingEntry::new)
            .collect())
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        if_none_match: Option<&str>,
    ) -> Result<ObjectDescriptor, BackendError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .set_if_none_match(if_none_match.map(ToOwned::to_owned))
            .send()
            .await
            .map_err(classify_sdk_error)?;

        Ok(ObjectDescriptor {
            content_length: output.content_length().and_then(|n| u64::try_from(n).ok()),
            content_type: output.content_type().map(ToOwned::to_owned),
            etag: output.e_tag().map(ToOwned::to_owned),
            body: byte_stream_body(output.body),
        })
    }
}

/// Adapt an SDK byte stream into an [`ObjectBody`].
fn byte_stream_body(body: ByteStream) -> ObjectBody {
    ObjectBody::from_stream(stream::unfold(body, |mut body| async move {
        body.next()
            .await
            .map(|chunk| (chunk.map_err(std::io::Error::other), body))
    }))
}

/// Classify an SDK error.
///
/// S3 answers a matching conditional GET with a bare `304` and no error
/// document, so the status code decides when no error code is present.
fn classify_sdk_error<E>(err: SdkError<E>) -> BackendError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match &err {
        SdkError::ServiceError(context) => {
            let status = context.raw().status().as_u16();
            let service_err = context.err();
            let code = classify_service_code(service_err.code(), status);
            let message = service_err
                .message()
                .map_or_else(|| DisplayErrorContext(&err).to_string(), ToOwned::to_owned);
            BackendError::service(code, message)
        }
        _ => BackendError::transport(DisplayErrorContext(&err).to_string()),
    }
}

/// Pick the error code for a service error from its code string and HTTP status.
fn classify_service_code(code: Option<&str>, status: u16) -> BackendErrorCode {
    match (code, status) {
        (_, 304) => BackendErrorCode::NotModified,
        (Some(code), _) => BackendErrorCode::from_code(code),
        (None, 404) => BackendErrorCode::NoSuchKey,
        (None, status) => BackendErrorCode::Other(format!("HTTP {status}")),
    }
}
