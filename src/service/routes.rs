//! HTTP routes: quote intake, health probe and metrics

use crate::error::QuoteError;
use crate::service::app::AppState;
use crate::types::{HealthResponse, QuoteRequest, QuoteResponse};
use crate::utils::generate_receipt_id;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, info_span, warn, Instrument};

pub const QUOTE_PATH: &str = "/api/quote";
pub const HEALTH_PATH: &str = "/api/health";
pub const METRICS_PATH: &str = "/metrics";

/// Build the router with every endpoint, CORS open to any origin
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route(QUOTE_PATH, post(quote_handler))
        .route(HEALTH_PATH, get(health_handler))
        .route(METRICS_PATH, get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint handler - shows service information
async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "service": crate::types::SERVICE_NAME,
        "version": crate::VERSION,
        "endpoints": [
            format!("POST {}", QUOTE_PATH),
            format!("GET {}", HEALTH_PATH),
            format!("GET {}", METRICS_PATH),
        ]
    }))
}

/// Quote intake: render the submission into an email and dispatch it
///
/// Answers success whenever the email could be rendered, whether or not it
/// could be addressed or the relay accepted it.
async fn quote_handler(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<QuoteResponse>) {
    let span = info_span!("quote", receipt = %generate_receipt_id());
    process_quote(state, payload).instrument(span).await
}

async fn process_quote(
    state: AppState,
    payload: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<QuoteResponse>) {
    let metrics = state.metrics();
    let started = Instant::now();

    let quote = match payload {
        Ok(Json(value)) => QuoteRequest::from_value(value),
        // Non-JSON bodies are treated as an empty submission
        Err(JsonRejection::MissingJsonContentType(_)) => {
            debug!("Quote posted without a JSON content type, treating as empty");
            QuoteRequest::new()
        }
        Err(rejection) => {
            let err = QuoteError::InvalidPayload {
                message: rejection.body_text(),
            };
            warn!("Rejected quote body: {}", err);
            metrics.record_quote_failed();
            return (
                StatusCode::BAD_REQUEST,
                Json(QuoteResponse::error("Invalid JSON body")),
            );
        }
    };

    metrics.record_quote_received();
    info!(
        "📋 Quote request received: {}",
        serde_json::to_string(&quote).unwrap_or_default()
    );
    let ignored = quote.unrecognized_keys();
    if !ignored.is_empty() {
        debug!("Fields not rendered in the email: {:?}", ignored);
    }

    let result = state.mailer().send_quote(&quote).await;
    metrics.observe_quote_duration(started.elapsed());

    match result {
        Ok(()) => (StatusCode::OK, Json(QuoteResponse::received())),
        Err(e) => {
            error!("❌ Quote error: {}", e);
            metrics.record_quote_failed();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(QuoteResponse::failed()),
            )
        }
    }
}

/// Liveness probe; never checks the SMTP relay
async fn health_handler() -> impl IntoResponse {
    debug!("Health check requested");
    (StatusCode::OK, Json(HealthResponse::healthy()))
}

/// Prometheus metrics endpoint handler
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    debug!("Metrics endpoint requested");

    match state.metrics().encode_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                "Failed to encode metrics".to_string(),
            )
        }
    }
}
