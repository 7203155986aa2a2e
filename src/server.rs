//! HTTP server and graceful shutdown.
//!
//! Each request gets its own [`HttpContext`] and runs through the pipeline
//! exactly once. What the pipeline leaves in `ctx.res` is written back; an
//! error that escapes every handler becomes a plain-text response with the
//! error's status.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or **Ctrl-C** the server:
//! 1. Immediately stops `listener.accept()`; no new connections are made.
//! 2. Lets every in-flight connection task run to completion.
//! 3. Returns from [`Server::serve`], which lets `main` exit cleanly.

use std::convert::Infallible;
use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::Full;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_BODY_LIMIT;
use crate::context::HttpContext;
use crate::error::Error;
use crate::handlers::HttpPipeline;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    body_limit: usize,
}

impl Server {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr, body_limit: DEFAULT_BODY_LIMIT }
    }

    /// Largest request body read into memory; larger bodies get `413`.
    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    /// Starts accepting connections and dispatching them through `pipeline`.
    ///
    /// Returns only after a full graceful shutdown.
    pub async fn serve(self, pipeline: HttpPipeline) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        info!(addr = %self.addr, handlers = pipeline.len(), body_limit = self.body_limit, "tether listening");

        // Tracks every connection task so shutdown can wait for them.
        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting immediately,
                // even with connections queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let pipeline = pipeline.clone();
                    let body_limit = self.body_limit;
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let pipeline = pipeline.clone();
                            async move { dispatch(pipeline, req, body_limit, remote_addr).await }
                        });

                        // HTTP/1.1 or HTTP/2, whichever the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet stays small.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("tether stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Runs one request through the pipeline and produces one response.
///
/// Never fails: every outcome, including a pipeline failure, is a response.
async fn dispatch(
    pipeline: HttpPipeline,
    req: hyper::Request<hyper::body::Incoming>,
    body_limit: usize,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let request = match Request::from_hyper(req, body_limit).await {
        Ok(request) => request,
        Err(e) => {
            warn!(peer = %remote_addr, status = e.status().as_u16(), "failed to read request body: {e}");
            return Ok(e.into_response().into_inner());
        }
    };

    Ok(respond(&pipeline, request).await.into_inner())
}

/// Invokes `pipeline` for `request` and turns the outcome into a response.
pub(crate) async fn respond(pipeline: &HttpPipeline, request: Request) -> Response {
    let method = request.method().clone();
    let path = request.path().to_owned();

    let mut ctx = HttpContext::new(request);
    let response = match pipeline.invoke(&mut ctx, None).await {
        Ok(()) => ctx.into_response(),
        Err(err) => {
            error!(%method, path = %path, kind = err.kind(), error = %err, "unhandled pipeline error");
            err.into_response()
        }
    };

    debug!(%method, path = %path, status = response.status_code().as_u16(), "request handled");
    response
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C only on Windows).
///
/// A signal that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{BoxFuture, Middleware, compose, shared};
    use crate::handlers::HttpNext;
    use http::{Method, StatusCode};

    struct Leaky;

    impl Middleware<HttpContext, (), Error> for Leaky {
        fn call<'a>(&'a self, ctx: &'a mut HttpContext, next: HttpNext<'a>) -> BoxFuture<'a, Result<(), Error>> {
            Box::pin(async move {
                let _ = next.run(ctx);
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn escaped_errors_become_responses() {
        let pipeline = compose([shared(Leaky), shared(crate::handlers::NotFound)]);
        let response = respond(&pipeline, Request::new(Method::GET, "/")).await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body(), b"next() in middleware[0] should be awaited".as_slice());
    }

    #[tokio::test]
    async fn empty_pipeline_answers_default_response() {
        let pipeline = compose([]);
        let response = respond(&pipeline, Request::new(Method::GET, "/")).await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert!(response.body().is_empty());
    }
}
