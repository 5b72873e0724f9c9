//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Request bodies are
//! collected up to the configured limit before routing, so handlers work on
//! `Request<Bytes>`.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::header::CONTENT_LENGTH;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Args;
use crate::evidence::EvidenceVault;
use crate::logging::AuditLogger;
use crate::routes;
use crate::store::Stores;
use crate::types::HrmError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Record stores for cases, reports and victims
    pub stores: Stores,
    /// Uploaded evidence files
    pub evidence: EvidenceVault,
    /// JSONL trail of mutations
    pub audit: AuditLogger,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, stores: Stores, evidence: EvidenceVault, audit: AuditLogger) -> Self {
        Self {
            args,
            stores,
            evidence,
            audit,
            started_at: Instant::now(),
        }
    }
}

/// Serve the API until Ctrl-C
pub async fn run(state: Arc<AppState>) -> Result<(), HrmError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "hrm listening on {} (store: {})",
        state.args.listen,
        state.stores.backend_name()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled");
    }

    let max_body = state.args.max_upload_bytes;
    let handler = move |addr: SocketAddr, req: Request<Bytes>| {
        routes::dispatch(Arc::clone(&state), addr, req)
    };

    serve(listener, max_body, handler, shutdown_signal()).await
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Accept connections and hand each collected request to `handler`
///
/// Stops accepting when `shutdown` resolves; connections already being
/// served run to completion on their own tasks.
pub async fn serve<H, Fut>(
    listener: TcpListener,
    max_body: usize,
    handler: H,
    shutdown: impl Future<Output = ()>,
) -> Result<(), HrmError>
where
    H: Fn(SocketAddr, Request<Bytes>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Response<Full<Bytes>>> + Send + 'static,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let handler = handler.clone();
                            async move {
                                Ok::<_, Infallible>(handle_request(handler, addr, max_body, req).await)
                            }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            error!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = &mut shutdown => {
                info!("No longer accepting connections");
                return Ok(());
            }
        }
    }
}

/// Log, collect the body within the limit, then route
async fn handle_request<H, Fut>(
    handler: H,
    addr: SocketAddr,
    max_body: usize,
    req: Request<Incoming>,
) -> Response<Full<Bytes>>
where
    H: Fn(SocketAddr, Request<Bytes>) -> Fut,
    Fut: Future<Output = Response<Full<Bytes>>>,
{
    info!("[{}] {} {}", addr, req.method(), req.uri().path());

    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if matches!(declared, Some(len) if len > max_body) {
        return too_large(max_body);
    }

    let (parts, body) = req.into_parts();
    let body = match Limited::new(body, max_body).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => return too_large(max_body),
        Err(e) => {
            warn!("[{}] Failed to read request body: {}", addr, e);
            return HrmError::BadRequest("Failed to read request body".to_string()).into_response();
        }
    };

    handler(addr, Request::from_parts(parts, body)).await
}

fn too_large(max_body: usize) -> Response<Full<Bytes>> {
    HrmError::PayloadTooLarge(format!("limit is {} bytes", max_body)).into_response()
}
