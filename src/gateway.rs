//! HTTP gateway exposing group search to chat transports and other tools.
//!
//! ## Endpoints
//!
//! - `GET /health`: liveness probe
//! - `POST /search`: run a search, returning the result and rendered messages
//! - `GET /last/{requester}`: the requester's last cached result

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use tgscout_search::{GroupSearch, SearchError, SearchResult};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::{GatewayConfig, RenderConfig};
use crate::error::{AppError, Result};
use crate::render::{render_invalid_query, render_result};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchBody {
    /// Free-text query.
    pub query: String,
    /// Result bound; the engine default when absent.
    #[serde(default)]
    pub max_results: Option<usize>,
    /// Requester id; when present the result is cached for `/last`.
    #[serde(default)]
    pub requester: Option<String>,
}

/// Successful `POST /search` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The search result.
    #[serde(flatten)]
    pub result: SearchResult,
    /// The result rendered as transport messages.
    pub messages: Vec<String>,
}

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable reason.
    pub error: String,
    /// Rendered message for the requester, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `GET /health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"healthy"`.
    pub status: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct AppState {
    engine: Arc<GroupSearch>,
    render: RenderConfig,
}

/// Build the gateway router over `engine`.
pub fn router(engine: Arc<GroupSearch>, render: RenderConfig) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/search", post(handle_search))
        .route("/last/{requester}", get(handle_last))
        .with_state(AppState { engine, render })
}

/// Running gateway.
pub struct Gateway {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Gateway {
    /// Start the gateway.
    ///
    /// Binds to `{config.host}:{config.port}` (use port `0` for auto-assign)
    /// and begins serving in a background tokio task.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot bind.
    pub async fn start(
        engine: Arc<GroupSearch>,
        config: &GatewayConfig,
        render: RenderConfig,
    ) -> Result<Self> {
        let app = router(engine, render);

        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| AppError::Gateway(format!("bind {bind_addr} failed: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| AppError::Gateway(format!("failed to get local addr: {e}")))?;

        info!("gateway listening on http://{addr}");

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = rx.await;
            });
            if let Err(e) = serve.await {
                tracing::error!("gateway error: {e}");
            }
        });

        Ok(Self {
            addr,
            shutdown: Some(tx),
            handle: Some(handle),
        })
    }

    /// Returns the address the gateway is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!("gateway task ended abnormally: {e}");
            }
        }
        info!("gateway stopped");
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_owned(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `POST /search`
async fn handle_search(State(state): State<AppState>, Json(body): Json<SearchBody>) -> Response {
    let max_results = body
        .max_results
        .unwrap_or(state.engine.config().default_max_results);

    let outcome = match body.requester.as_deref() {
        Some(requester) => state
            .engine
            .search_for(requester, &body.query, max_results)
            .await
            .map(|r| (*r).clone()),
        None => state.engine.search(&body.query, max_results).await,
    };

    match outcome {
        Ok(result) => {
            let messages = render_result(&result, &state.render);
            (StatusCode::OK, Json(SearchResponse { result, messages })).into_response()
        }
        Err(SearchError::InvalidQuery(reason)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                message: Some(render_invalid_query(&reason)),
                error: reason,
            }),
        )
            .into_response(),
        Err(SearchError::Closed) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: SearchError::Closed.to_string(),
                message: None,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                    message: None,
                }),
            )
                .into_response()
        }
    }
}

/// `GET /last/{requester}`
async fn handle_last(State(state): State<AppState>, Path(requester): Path<String>) -> Response {
    match state.engine.last_result(&requester).await {
        Some(result) => (StatusCode::OK, Json((*result).clone())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("no recent result for '{requester}'"),
                message: None,
            }),
        )
            .into_response(),
    }
}
