//! End-to-end tests against a live S3-compatible server.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use aws_sdk_s3::primitives::ByteStream;
    use s3httpd_core::ProxyConfig;
    use s3httpd_core::backend::S3Backend;

    use crate::{TestServer, http_client, s3_client, test_bucket_name};

    async fn create_bucket(client: &aws_sdk_s3::Client, prefix: &str) -> String {
        let name = test_bucket_name(prefix);
        client
            .create_bucket()
            .bucket(&name)
            .send()
            .await
            .unwrap_or_else(|e| panic!("failed to create bucket {name}: {e}"));
        name
    }

    async fn put(client: &aws_sdk_s3::Client, bucket: &str, key: &str, body: &'static [u8]) {
        client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from_static(body))
            .send()
            .await
            .unwrap_or_else(|e| panic!("failed to put {key}: {e}"));
    }

    async fn cleanup_bucket(client: &aws_sdk_s3::Client, bucket: &str, keys: &[&str]) {
        for key in keys {
            let _ = client.delete_object().bucket(bucket).key(*key).send().await;
        }
        let _ = client.delete_bucket().bucket(bucket).send().await;
    }

    #[tokio::test]
    #[ignore = "requires running S3-compatible server"]
    async fn test_should_proxy_live_bucket() {
        let client = s3_client();
        let bucket = create_bucket(&client, "proxy").await;
        put(&client, &bucket, "a.txt", b"alpha").await;
        put(&client, &bucket, "b/c.txt", b"charlie").await;

        let config = ProxyConfig::builder()
            .bucket(bucket.clone())
            .build()
            .validate()
            .expect("valid config");
        let backend = Arc::new(S3Backend::from_client(client.clone()));
        let server = TestServer::start(config, backend).await;
        let http = http_client();

        let listing = http
            .get(server.url("/"))
            .send()
            .await
            .expect("request")
            .text()
            .await
            .expect("body");
        assert!(listing.contains(&format!("<h1>Contents of Bucket {bucket}</h1>")));
        assert!(listing.contains("<li><a href=\"a.txt\">a.txt</a></li>"));
        assert!(listing.contains("<li><a href=\"b/c.txt\">b/c.txt</a></li>"));

        let resp = http
            .get(server.url("/b/c.txt"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers()
                .get("content-disposition")
                .and_then(|v| v.to_str().ok()),
            Some("attachment; filename=\"c.txt\""),
        );
        let etag = resp
            .headers()
            .get("etag")
            .and_then(|v| v.to_str().ok())
            .expect("etag")
            .to_owned();
        assert_eq!(resp.text().await.expect("body"), "charlie");

        let resp = http
            .get(server.url("/b/c.txt"))
            .header("if-none-match", &etag)
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 304);
        assert_eq!(
            resp.headers().get("etag").and_then(|v| v.to_str().ok()),
            Some(etag.as_str())
        );

        let resp = http
            .get(server.url("/missing.txt"))
            .header("if-none-match", &etag)
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 404);

        server.stop().await;
        cleanup_bucket(&client, &bucket, &["a.txt", "b/c.txt"]).await;
    }

    #[tokio::test]
    #[ignore = "requires running S3-compatible server"]
    async fn test_should_return_internal_error_for_missing_bucket() {
        let client = s3_client();
        let config = ProxyConfig::builder()
            .bucket(test_bucket_name("absent"))
            .build()
            .validate()
            .expect("valid config");
        let server = TestServer::start(config, Arc::new(S3Backend::from_client(client))).await;

        let resp = http_client()
            .get(server.url("/"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 500);
        assert_eq!(resp.text().await.expect("body"), "Internal Error\n");

        server.stop().await;
    }
}
