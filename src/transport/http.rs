//! HTTP/JSON transport
//!
//! # API Endpoints
//!
//! Every endpoint except `/health` requires the shared secret in the
//! `X-API-Key` header. A missing, wrong or unconfigured key yields
//! `401 {"error":"unauthorized"}`.
//!
//! ## GET /quotes
//!
//! The full corpus, in file order:
//!
//! ```json
//! [{"Author": "A", "Text": "Q1"}, {"Author": "B", "Text": "Q2"}]
//! ```
//!
//! This listing bypasses allocation tracking entirely.
//!
//! ## GET /random?clientId=<id>
//!
//! One quote. With a non-empty `clientId` the quote is one the client has not
//! received since the last daily reset; once every quote has been issued the
//! response is `429 {"error":"no more quotes for today"}`. Without a
//! `clientId` any quote may be returned and nothing is tracked. If
//! `clientId` is repeated, the first value is used.
//!
//! ## GET /metrics
//!
//! Prometheus text exposition.
//!
//! ## GET /health
//!
//! Health check endpoint. Returns "OK" with 200 status.

use super::{AppState, Transport};
use crate::auth::API_KEY_HEADER;
use crate::core::Quote;
use crate::metrics::{Endpoint, Outcome};
use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    Router,
    extract::{Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Query parameters of `GET /random`
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RandomQuery {
    /// Opaque client identifier; absent or empty means "untracked"
    pub client_id: Option<String>,
}

impl RandomQuery {
    pub const CLIENT_ID: &'static str = "clientId";

    /// Build from decoded query pairs
    ///
    /// Repeated parameters are not an error: the first `clientId` wins and
    /// unknown parameters are ignored.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        RandomQuery {
            client_id: pairs
                .into_iter()
                .find(|(key, _)| key == Self::CLIENT_ID)
                .map(|(_, value)| value),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    /// Error message
    pub error: String,
}

/// HTTP transport implementation
pub struct HttpTransport {
    host: String,
    port: u16,
}

impl HttpTransport {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn start(self, state: Arc<AppState>) -> Result<()> {
        let app = router(state);

        let listener = tokio::net::TcpListener::bind((self.host.as_str(), self.port))
            .await
            .with_context(|| format!("Failed to bind {}:{}", self.host, self.port))?;

        tracing::info!("HTTP server listening on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

/// Build the application router
///
/// Exposed separately from [`HttpTransport`] so the routes can be served on
/// any listener or driven directly in tests.
pub fn router(state: Arc<AppState>) -> Router {
    let gated = Router::new()
        .route("/quotes", get(handle_quotes))
        .route("/random", get(handle_random))
        .route("/metrics", get(handle_metrics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .merge(gated)
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
}

async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .map(|v| v.as_bytes());

    if !state.gate.authorize(presented) {
        tracing::debug!("Rejected unauthorized request to {}", req.uri().path());
        state.metrics.record_unauthorized();
        return error_response(StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }

    next.run(req).await
}

async fn handle_quotes(State(state): State<Arc<AppState>>) -> Json<Vec<Quote>> {
    let start = Instant::now();
    let quotes = state.tracker.quotes().as_slice().to_vec();

    state
        .metrics
        .record_request(Endpoint::Quotes, elapsed_micros(start), Outcome::Served);
    Json(quotes)
}

async fn handle_random(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Quote>, (StatusCode, Json<HttpErrorResponse>)> {
    let start = Instant::now();
    let query = RandomQuery::from_pairs(pairs);

    let client_id = query.client_id.as_deref().filter(|id| !id.is_empty());
    let result = match client_id {
        None => Ok(state.tracker.issue_any()),
        Some(id) => state.tracker.issue_for_client(id),
    };

    match result {
        Ok(quote) => {
            state
                .metrics
                .record_request(Endpoint::Random, elapsed_micros(start), Outcome::Served);
            Ok(Json(quote))
        }
        Err(exhausted) => {
            tracing::debug!("Client {:?} has no quotes left today", client_id);
            state.metrics.record_request(
                Endpoint::Random,
                elapsed_micros(start),
                Outcome::Exhausted,
            );
            Err(error_response(
                StatusCode::TOO_MANY_REQUESTS,
                &exhausted.to_string(),
            ))
        }
    }
}

async fn handle_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state
        .metrics
        .update_active_clients(state.tracker.client_count());

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.export_prometheus(),
    )
}

fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<HttpErrorResponse>) {
    (
        status,
        Json(HttpErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn elapsed_micros(start: Instant) -> u64 {
    start.elapsed().as_micros() as u64
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
