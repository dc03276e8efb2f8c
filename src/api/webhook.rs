use crate::api::signature::SignatureVerifier;
use crate::payload::WebhookPayload;
use crate::record::normalize_payload;
use crate::store::MessageLog;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub message_log: Arc<MessageLog>,
    /// Handshake secret; `None` refuses every handshake
    pub verify_token: Option<String>,
    /// Optional payload signature check, run before parsing
    pub signature_verifier: Option<Arc<dyn SignatureVerifier>>,
    /// Larger bodies are rejected with 413
    pub body_limit_bytes: usize,
}

/// Handshake query (`hub.mode`, `hub.verify_token`, `hub.challenge`)
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// Success response for message delivery
#[derive(Serialize)]
struct ReceiveResponse {
    status: &'static str,
    saved: usize,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create router with the webhook endpoints
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.body_limit_bytes;
    Router::new()
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// GET /webhook - Subscription handshake
async fn verify_webhook(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    let token_matches = match (&state.verify_token, &query.verify_token) {
        (Some(expected), Some(given)) => expected == given,
        _ => false,
    };

    if query.mode.as_deref() == Some("subscribe") && token_matches {
        info!("Webhook verification succeeded");
        let challenge = query.challenge.unwrap_or_default();
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain")],
            challenge,
        )
            .into_response()
    } else {
        warn!(mode = ?query.mode, "Webhook verification failed");
        (StatusCode::FORBIDDEN, "Verification token mismatch").into_response()
    }
}

/// POST /webhook - Normalize delivered messages and append them to the log
#[instrument(name = "webhook", skip_all, fields(delivery_id = %Uuid::now_v7()))]
async fn receive_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ReceiveResponse>, AppError> {
    info!(bytes = body.len(), "Webhook payload received");

    if let Some(verifier) = &state.signature_verifier {
        if !verifier.verify(&headers, &body) {
            warn!("Signature verification failed");
            return Err(AppError::Forbidden("invalid signature".to_string()));
        }
    }

    if body.is_empty() {
        return Err(AppError::BadRequest("No JSON".to_string()));
    }
    let value: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid JSON: {}", e)))?;
    let payload = WebhookPayload::from_value(&value)
        .ok_or_else(|| AppError::BadRequest("No JSON".to_string()))?;

    let records = normalize_payload(&payload);
    info!(
        object = payload.object_type().unwrap_or(""),
        records = records.len(),
        "Payload normalized"
    );
    for record in &records {
        debug!(
            page_id = %record.page_id,
            sender_id = %record.sender_id,
            message_id = %record.message_id,
            "Record normalized"
        );
    }

    let log = Arc::clone(&state.message_log);
    let saved = tokio::task::spawn_blocking(move || log.append_batch(&records))
        .await
        .map_err(|e| {
            error!(error = %e, "Message log task failed");
            AppError::Storage(e.to_string())
        })?
        .map_err(|e| {
            error!(error = %e, "Failed to append to message log");
            AppError::Storage(e.to_string())
        })?;

    info!(saved, "Batch written");

    Ok(Json(ReceiveResponse {
        status: "received",
        saved,
    }))
}

/// GET /health - Liveness probe
async fn health() -> Json<Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Application error types
#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Forbidden(String),
    Storage(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        let body = Json(ErrorResponse {
            error: error_message,
        });
        (status, body).into_response()
    }
}
