use crate::middleware::request_id_middleware;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware as axum_mw,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use grocer_catalog::Catalog;
use grocer_core::{GrocerError, ResultItem};
use grocer_search::SearchEngine;
use serde::Deserialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, warn};

/// Shared application state.
pub struct AppState {
    /// Search engine serving `/search`.
    pub engine: Arc<SearchEngine>,
    /// Catalog reported on by `/health`.
    pub catalog: Arc<dyn Catalog>,
}

/// The HTTP front end.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the router serving `/search` and `/health`.
    pub fn build(engine: Arc<SearchEngine>, catalog: Arc<dyn Catalog>) -> Router {
        let state = Arc::new(AppState { engine, catalog });

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/search", get(search_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors)
                    .layer(axum_mw::from_fn(request_id_middleware)),
            )
    }
}

/// Query string of `GET /search`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Raw query text.
    pub q: Option<String>,
}

/// A [`GrocerError`] rendered as a JSON error response.
#[derive(Debug)]
pub struct ApiError(pub GrocerError);

impl From<GrocerError> for ApiError {
    fn from(err: GrocerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            warn!(error = %self.0, "Rejected request");
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %self.0, "Upstream unavailable");
            StatusCode::SERVICE_UNAVAILABLE
        };
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ResultItem>>, ApiError> {
    let q = params.q.unwrap_or_default();
    if q.trim().is_empty() {
        return Err(GrocerError::InvalidQuery(
            "query parameter 'q' must not be empty".to_string(),
        )
        .into());
    }

    let results = state.engine.search(&q).await?;
    debug!(results = results.len(), "Search served");
    Ok(Json(results))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let entries = state.catalog.count().await?;
    let body = serde_json::json!({"status": "ok", "service": "grocer", "entries": entries});
    Ok(Json(body).into_response())
}

/// Resolves on Ctrl+C or SIGTERM, for `axum::serve(..).with_graceful_shutdown`.
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
