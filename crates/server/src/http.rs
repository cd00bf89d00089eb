//! HTTP endpoints
//!
//! REST API for essay correction. Error payloads use a `detail` field,
//! matching what the web frontend expects.

use axum::{
    extract::{Json, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(&state.settings.server.cors_origins);

    Router::new()
        .route("/correct/", post(correct_essay))
        .route("/health", get(health_check))
        .route("/", get(read_root))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build the CORS layer from configured origins.
///
/// No origins configured means permissive, matching a local development
/// setup where the frontend runs on an arbitrary port.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        tracing::warn!("no CORS origins configured, allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(origin = %origin, "invalid CORS origin, skipping");
                None
            })
        })
        .collect();

    tracing::info!(origins = parsed.len(), "CORS configured");
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

#[derive(Debug, Deserialize)]
pub struct EssayRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CorrectionResponse {
    pub correction: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Correct one essay.
///
/// Validation happens here, not in the pipeline: an empty essay is a
/// client error, everything the pipeline reports is a server-side one.
async fn correct_essay(
    State(state): State<AppState>,
    Json(request): Json<EssayRequest>,
) -> impl IntoResponse {
    tracing::info!(chars = request.text.len(), "correction request received");

    if request.text.trim().is_empty() {
        tracing::warn!("correction request with empty text");
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!(ErrorResponse::new(
                "O texto da redação não pode estar vazio."
            ))),
        );
    }

    match state.pipeline.run(&request.text).await {
        Ok(correction) => {
            tracing::info!("correction generated");
            (
                StatusCode::OK,
                Json(serde_json::json!(CorrectionResponse { correction })),
            )
        },
        Err(err) => {
            tracing::error!(error = %err, "correction pipeline failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!(ErrorResponse::new(err.to_string()))),
            )
        },
    }
}

/// Root status endpoint
async fn read_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "Corretor API está online!" }))
}

/// Health check
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
