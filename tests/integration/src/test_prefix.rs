//! Mount prefix integration tests.

#[cfg(test)]
mod tests {
    use s3httpd_core::backend::{MemoryBackend, MemoryObject};

    use crate::{TestServer, http_client};

    /// `href` attribute values on a listing page, in order.
    fn hrefs(html: &str) -> Vec<String> {
        html.split("href=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .map(ToOwned::to_owned)
            .collect()
    }

    fn backend() -> MemoryBackend {
        MemoryBackend::new()
            .with_object(MemoryObject::new("a.txt", "alpha"))
            .with_object(MemoryObject::new("docs/", "marker"))
    }

    #[tokio::test]
    async fn test_should_serve_objects_under_prefix() {
        let server = TestServer::memory(backend(), "/files/").await;

        let resp = http_client()
            .get(server.url("/files/a.txt"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.expect("body"), "alpha");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_link_listing_entries_through_prefix() {
        let server = TestServer::memory(backend(), "files").await;
        let client = http_client();

        for path in ["/files", "/files/"] {
            let body = client
                .get(server.url(path))
                .send()
                .await
                .expect("request")
                .text()
                .await
                .expect("body");
            assert!(body.contains("<li><a href=\"/files/a.txt\">a.txt</a></li>"));
        }

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_reject_paths_outside_prefix_without_backend_call() {
        let server = TestServer::memory(backend(), "files").await;
        let client = http_client();

        for path in ["/", "/a.txt", "/other/a.txt", "/filesx/a.txt"] {
            let resp = client
                .get(server.url(path))
                .send()
                .await
                .expect("request");
            assert_eq!(resp.status(), 404, "path {path}");
            assert_eq!(resp.text().await.expect("body"), "Not Found\n");
        }
        assert_eq!(server.backend().calls(), 0);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_not_substitute_index_document_under_prefix() {
        let server = TestServer::memory(backend(), "files").await;

        let resp = http_client()
            .get(server.url("/files/docs/"))
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.text().await.expect("body"), "marker");

        server.stop().await;
    }

    #[tokio::test]
    async fn test_should_fetch_every_listed_link() {
        let keys = ["a%20b.txt", "q?x.txt", "h#1.txt", "plain.txt", "sub dir/é.txt"];
        for prefix in ["", "files"] {
            let backend = keys.iter().fold(MemoryBackend::new(), |backend, key| {
                backend.with_object(MemoryObject::new(*key, format!("body of {key}")))
            });
            let server = TestServer::memory(backend, prefix).await;
            let client = http_client();

            let listing_path = if prefix.is_empty() { "/" } else { "/files/" };
            let html = client
                .get(server.url(listing_path))
                .send()
                .await
                .expect("request")
                .text()
                .await
                .expect("body");
            let links = hrefs(&html);
            assert_eq!(links.len(), keys.len(), "listing {html}");

            for (href, key) in links.iter().zip(keys) {
                let path = if prefix.is_empty() {
                    format!("/{href}")
                } else {
                    href.clone()
                };
                let resp = client
                    .get(server.url(&path))
                    .send()
                    .await
                    .expect("request");
                assert_eq!(resp.status(), 200, "href {href} for key {key:?}");
                assert_eq!(resp.text().await.expect("body"), format!("body of {key}"));
            }

            server.stop().await;
        }
    }
}
