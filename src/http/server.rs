//! Router assembly and the serve loop.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::access::gate::{access_gate_middleware, AccessGate};
use crate::config::schema::ShareConfig;
use crate::http::error::ApiError;
use crate::observability::metrics;
use crate::serve::file::FileServer;
use crate::upload::ingest::{UploadIngestor, UploadOutcome};

/// Headroom on top of the upload limit for multipart framing and part
/// headers when capping the buffered request body.
const MULTIPART_ENVELOPE_BYTES: u64 = 64 * 1024;

/// Failures while assembling the server from validated configuration.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("serve root unavailable: {0}")]
    Root(#[from] std::io::Error),

    #[error("invalid network in allow-list: {0}")]
    Network(#[from] ipnet::AddrParseError),
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AccessGate>,
    pub files: Arc<FileServer>,
    pub ingestor: Arc<UploadIngestor>,
    /// Cap on the buffered POST body: upload limit plus envelope.
    pub upload_body_limit: usize,
}

/// The assembled server: router plus the bits `run` needs.
pub struct HttpServer {
    router: Router,
    gate: Arc<AccessGate>,
    sweep_interval: Duration,
}

impl HttpServer {
    pub fn new(config: &ShareConfig) -> Result<Self, ServerError> {
        let gate = Arc::new(AccessGate::new(&config.access, &config.rate_limit)?);
        let files = Arc::new(FileServer::new(&config.serve)?);
        let ingestor = Arc::new(UploadIngestor::new(&config.upload));

        let upload_body_limit =
            usize::try_from(config.upload.max_upload_bytes.saturating_add(MULTIPART_ENVELOPE_BYTES))
                .unwrap_or(usize::MAX);

        let state = AppState {
            gate: Arc::clone(&gate),
            files,
            ingestor,
            upload_body_limit,
        };
        let router = build_router(
            state,
            Duration::from_secs(config.listener.request_timeout_secs),
        );

        Ok(Self {
            router,
            gate,
            sweep_interval: Duration::from_secs(config.rate_limit.sweep_interval_secs),
        })
    }

    /// Serve until ctrl-c or SIGTERM. Spawns the limiter sweep task for
    /// the lifetime of the server.
    pub async fn run(self, listener: tokio::net::TcpListener) -> std::io::Result<()> {
        let gate = Arc::clone(&self.gate);
        let sweep_interval = self.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                gate.sweep();
                tracing::debug!("rate limiter sweep completed");
            }
        });

        tracing::info!(addr = %listener.local_addr()?, "listening");
        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }
}

fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let gate = Arc::clone(&state.gate);
    Router::new()
        .route("/", get(get_handler).post(post_handler))
        .route("/{*path}", get(get_handler).post(post_handler))
        .with_state(state)
        // Uploads are capped explicitly in the handler; the framework
        // default would reject large files first.
        .layer(DefaultBodyLimit::disable())
        .layer(middleware::from_fn_with_state(gate, access_gate_middleware))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn get_handler(State(state): State<AppState>, uri: Uri, headers: HeaderMap) -> Response {
    let response = state
        .files
        .serve(uri.path(), &headers)
        .await
        .unwrap_or_else(|err| err.into_response());
    metrics::record_request("GET", response.status().as_u16());
    response
}

async fn post_handler(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let response = handle_upload(&state, &uri, &headers, body)
        .await
        .unwrap_or_else(|err| err.into_response());
    metrics::record_request("POST", response.status().as_u16());
    response
}

async fn handle_upload(
    state: &AppState,
    uri: &Uri,
    headers: &HeaderMap,
    body: Body,
) -> Result<Response, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !content_type.starts_with("multipart/form-data") {
        return Err(ApiError::BadRequest(
            "expected multipart/form-data".to_string(),
        ));
    }

    let target_dir = resolve_target_dir(state, uri.path()).await?;

    // Reject before buffering past the cap; a stalled or bottomless
    // body cannot exhaust memory.
    let max = state.ingestor.max_upload_bytes();
    let body = match axum::body::to_bytes(body, state.upload_body_limit).await {
        Ok(body) => body,
        Err(err) if is_length_limit(&err) => {
            return Err(ApiError::BadRequest(format!(
                "upload body exceeds limit of {max} bytes"
            )));
        }
        Err(err) => {
            tracing::warn!(%err, "upload body read failed");
            return Err(ApiError::BadRequest(format!(
                "failed to read upload body: {err}"
            )));
        }
    };

    match state.ingestor.ingest(content_type, &body, &target_dir).await? {
        UploadOutcome::Accepted { filenames } => {
            metrics::record_upload(true);
            tracing::info!(count = filenames.len(), dir = %target_dir.display(), "upload complete");
            Ok((
                StatusCode::SEE_OTHER,
                [(header::LOCATION, uri.path().to_string())],
            )
                .into_response())
        }
        UploadOutcome::Rejected(rejection) => {
            metrics::record_upload(false);
            Err(ApiError::UploadRejected(rejection))
        }
        UploadOutcome::NoValidFiles => Err(ApiError::BadRequest(
            "no valid files found in upload".to_string(),
        )),
    }
}

/// POSTs target the directory being listed; a POST to a file path lands
/// in that file's directory.
async fn resolve_target_dir(state: &AppState, uri_path: &str) -> Result<PathBuf, ApiError> {
    let resolved = state.files.resolve(uri_path)?;
    let target = if is_dir(&resolved).await {
        resolved
    } else {
        resolved
            .parent()
            .map(Path::to_path_buf)
            .ok_or(ApiError::NotFound)?
    };
    if !is_dir(&target).await {
        return Err(ApiError::NotFound);
    }
    Ok(target)
}

/// Whether a body-read failure was the configured size cap, as opposed
/// to a transport failure mid-body.
fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(inner) = source {
        if inner.is::<http_body_util::LengthLimitError>() {
            return true;
        }
        source = inner.source();
    }
    false
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}


async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!(%err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
