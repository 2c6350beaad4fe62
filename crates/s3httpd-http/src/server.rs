//! Accept loop with graceful shutdown.

use std::future::Future;

use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use s3httpd_core::ObjectBackend;

use crate::service::{ProxyHttpConfig, ProxyHttpService};

/// Serve connections from `listener` until `shutdown` resolves.
///
/// Each connection runs on its own task. Once `shutdown` fires the listener
/// stops accepting and in-flight requests are drained before this returns.
pub async fn serve<B, F>(listener: TcpListener, service: ProxyHttpService<B>, shutdown: F)
where
    B: ObjectBackend + ?Sized,
    F: Future<Output = ()>,
{
    let graceful = GracefulShutdown::new();
    let http = connection_builder(service.config());

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.for_peer(peer_addr);
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        // Aborted bodies and client resets land here.
                        debug!(peer_addr = %peer_addr, error = %e, "connection closed with error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained");
}

/// Connection builder with the configured HTTP/1 limits applied.
fn connection_builder(config: &ProxyHttpConfig) -> HttpConnBuilder<TokioExecutor> {
    let mut http = HttpConnBuilder::new(TokioExecutor::new());
    {
        let mut http1 = http.http1();
        http1.max_buf_size(config.max_header_bytes);
        if let Some(timeout) = config.header_read_timeout {
            http1.timer(TokioTimer::new()).header_read_timeout(timeout);
        }
    }
    http
}
