//! HTTP server implementation
//!
//! hyper http1 with TokioIo; one task per connection, no shared mutable
//! state between requests.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Args;
use crate::error::Result;
use crate::routes;
use crate::staging::StagingArea;
use crate::storage::ContentStore;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Storage network client, constructed once at startup
    pub store: Arc<dyn ContentStore>,
    /// Staging area for upload payloads
    pub staging: StagingArea,
}

impl AppState {
    pub fn new(args: Args, store: Arc<dyn ContentStore>, staging: StagingArea) -> Self {
        Self {
            args,
            store,
            staging,
        }
    }
}

/// Bind the configured address and serve until the process exits.
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;
    info!("Wicket listening on {}", state.args.listen);
    serve(listener, state).await
}

/// Serve connections from an already-bound listener.
///
/// Split from [`run`] so tests can bind an ephemeral port first.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        warn!(addr = %addr, error = %err, "Connection error");
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (method, path.as_str()) {
        (Method::GET, "/") => routes::index_page(),

        (Method::POST, "/upload") => routes::handle_upload(req, Arc::clone(&state)).await,

        // Liveness probe - returns 200 while the gateway is running
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(),

        // Readiness probe - returns 200 only if the storage node answers
        (Method::GET, "/ready") | (Method::GET, "/readyz") => {
            routes::readiness_check(Arc::clone(&state)).await
        }

        // Version info for deployment verification
        (Method::GET, "/version") => routes::version_info(),

        // CORS preflight
        (Method::OPTIONS, _) => preflight_response(),

        _ => not_found_response(&path),
    };

    Ok(response)
}

fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "success": false,
        "error": format!("Not found: {}", path),
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
