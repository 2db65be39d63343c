//! HTTP surface for BigQuery remote-function calls.
//!
//! | Route | Method | Description |
//! |-------|--------|-------------|
//! | `/` | POST | Remote-function batch endpoint |
//! | `/generate` | POST | Alias of `/` |
//! | `/healthz` | GET | Liveness probe |

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::handler::{ErrorEnvelope, HandlerResponse, ReplyEnvelope, RequestHandler};
use crate::Result;

/// BigQuery caps a remote-function request at 10 MB.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    handler: Arc<RequestHandler>,
}

pub fn router(handler: Arc<RequestHandler>) -> Router {
    let state = AppState { handler };

    Router::new()
        .route("/", post(remote_function))
        .route("/generate", post(remote_function))
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

/// A body that cannot be read (over the size limit, broken connection) is an
/// envelope failure like any other and gets the JSON error envelope.
async fn remote_function(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> HandlerResponse {
    match body {
        Ok(body) => state.handler.handle(&body).await,
        Err(rejection) => {
            let message = rejection.body_text();
            warn!(status = %rejection.status(), error = %message, "rejecting request body");
            HandlerResponse::Error(message)
        }
    }
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
        match self {
            HandlerResponse::Replies(replies) => {
                (status, Json(ReplyEnvelope { replies })).into_response()
            }
            HandlerResponse::Error(error_message) => {
                (status, Json(ErrorEnvelope { error_message })).into_response()
            }
        }
    }
}

/// Bind and serve until SIGINT/SIGTERM.
pub async fn serve(cfg: &ServerConfig, handler: Arc<RequestHandler>) -> Result<()> {
    let addr = cfg.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "listening");

    axum::serve(listener, router(handler))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
