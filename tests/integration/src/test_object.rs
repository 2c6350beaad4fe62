//! Object fetch integration tests: headers, conditional requests, errors.

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use s3httpd_core::backend::{MemoryBackend, MemoryObject};
    use s3httpd_core::{BackendError, BackendErrorCode};

    use crate::{TestServer, http_client};

    fn header<'a>(resp: &'a reqwest::Response, name: &str) -> Option<&'a str> {
        resp.headers().get(name).and_then(|v| v.to_str().ok())
    }

    fn backend() -> MemoryBackend {
        MemoryBackend::new()
            .with_object(
                MemoryObject::new("reports/report.json", "{\"ok\":true}")
                    .with_content_type("application/json")
                    .with_etag("\"etag-1\""),
            )
            .with_object(MemoryObject::new("report.zzunknown", "raw"))
            .with_object(MemoryObject::new("docs/index.html", "<h1>docs</h1>"))
    }

    #[tokio::test]
    async fn test_should_download_object_with_headers() {
        let server = TestServer::memory(backend(), "").await;

        let resp = http_client()
            .get(server.url("/reports/report.json"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);
        assert_eq!(header(&resp, "content-type"), Some("application/json"));
        assert_eq!(header(&resp, "content-length"), Some("11"));
        assert_eq!(header(&resp, "etag"), Some("\"etag-1\""));
        assert_eq!(
            header(&resp, "content-disposition"),
            Some("attachment; filename=\"report.json\""),
        );
        assert_eq!(resp.text().await.expect("body"), "{\"ok\":true}");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_fall_back_to_octet_stream() {
        let server = TestServer::memory(backend(), "").await;

        let resp = http_client()
            .get(server.url("/report.zzunknown"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);
        assert_eq!(
            header(&resp, "content-type"),
            Some("application/octet-stream")
        );
        assert_eq!(
            header(&resp, "content-disposition"),
            Some("attachment; filename=\"report.zzunknown\""),
        );

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_serve_index_document_for_directory() {
        let server = TestServer::memory(backend(), "").await;

        let resp = http_client()
            .get(server.url("/docs/"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);
        assert_eq!(header(&resp, "content-type"), Some("text/html"));
        assert_eq!(
            header(&resp, "content-disposition"),
            Some("attachment; filename=\"index.html\""),
        );
        assert_eq!(resp.text().await.expect("body"), "<h1>docs</h1>");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_answer_conditional_request() {
        let server = TestServer::memory(backend(), "").await;
        let client = http_client();

        let first = client
            .get(server.url("/reports/report.json"))
            .send()
            .await
            .expect("request");
        let etag = header(&first, "etag").expect("etag").to_owned();

        let resp = client
            .get(server.url("/reports/report.json"))
            .header("if-none-match", &etag)
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 304);
        assert_eq!(header(&resp, "etag"), Some(etag.as_str()));
        assert!(resp.bytes().await.expect("body").is_empty());

        let resp = client
            .get(server.url("/reports/report.json"))
            .header("if-none-match", "\"stale\"")
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_return_not_found_for_missing_key() {
        let server = TestServer::memory(backend(), "").await;

        for etag in [None, Some("\"etag-1\"")] {
            let mut req = http_client().get(server.url("/missing.txt"));
            if let Some(etag) = etag {
                req = req.header("if-none-match", etag);
            }
            let resp = req.send().await.expect("request");
            assert_eq!(resp.status(), 404);
            assert_eq!(
                header(&resp, "content-type"),
                Some("text/plain; charset=utf-8")
            );
            assert_eq!(header(&resp, "x-content-type-options"), Some("nosniff"));
            assert_eq!(resp.text().await.expect("body"), "File Not Found\n");
        }

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_serve_head_without_body() {
        let server = TestServer::memory(backend(), "").await;

        let resp = http_client()
            .head(server.url("/reports/report.json"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);
        assert_eq!(header(&resp, "content-length"), Some("11"));
        assert_eq!(header(&resp, "etag"), Some("\"etag-1\""));
        assert!(resp.bytes().await.expect("body").is_empty());

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_reject_write_methods() {
        let server = TestServer::memory(backend(), "").await;

        for method in [Method::PUT, Method::POST, Method::DELETE] {
            let resp = http_client()
                .request(method, server.url("/reports/report.json"))
                .body("payload")
                .send()
                .await
                .expect("request");
            assert_eq!(resp.status(), 405);
            assert_eq!(header(&resp, "allow"), Some("GET, HEAD"));
        }
        assert_eq!(server.backend().calls(), 0);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_hide_backend_fault_details() {
        let backend = MemoryBackend::new().failing_with(BackendError::service(
            BackendErrorCode::AccessDenied,
            "Access Denied for arn:aws:s3:::demo",
        ));
        let server = TestServer::memory(backend, "").await;

        let resp = http_client()
            .get(server.url("/reports/report.json"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 500);
        assert_eq!(resp.text().await.expect("body"), "Internal Error\n");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_abort_response_on_mid_stream_failure() {
        let backend = MemoryBackend::new()
            .with_object(MemoryObject::new("big.bin", vec![1u8; 4096]).failing_after(1024));
        let server = TestServer::memory(backend, "").await;
        let client = http_client();

        // The head may or may not be flushed before the connection is dropped,
        // but the client must never see a complete body.
        let outcome = match client.get(server.url("/big.bin")).send().await {
            Ok(resp) => {
                assert_eq!(resp.status(), 200);
                resp.bytes().await.map(|bytes| bytes.len())
            }
            Err(err) => Err(err),
        };
        assert!(outcome.is_err(), "truncated body must fail: {outcome:?}");

        // Other connections are unaffected.
        let backend_calls = server.backend().calls();
        let resp = client.get(server.url("/")).send().await.expect("request");
        assert_eq!(resp.status(), 200);
        assert_eq!(server.backend().calls(), backend_calls + 1);

        server.stop().await;
    }
}
