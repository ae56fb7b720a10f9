use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use teloxide::types::Update;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
};

use super::AppState;

/// Banner shown at the service root
pub async fn index(State(state): State<AppState>) -> String {
    format!(
        "🎬 Movie picker bot is running with {} storage!",
        state.runtime.controller().watchlist().store_name()
    )
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Telegram webhook endpoint
///
/// Accepted updates are always answered with 200: a failed reply is logged rather
/// than reported, so Telegram does not redeliver an update that was already applied.
pub async fn webhook(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<Update>, JsonRejection>,
) -> AppResult<StatusCode> {
    if token != *state.webhook_token {
        tracing::warn!(request_id = %request_id, "Webhook called with wrong token");
        return Err(AppError::Unauthorized);
    }

    let Json(update) = payload.map_err(|e| {
        tracing::warn!(request_id = %request_id, error = %e, "Rejected webhook body");
        AppError::InvalidInput(e.body_text())
    })?;

    let update_id = update.id.0;
    tracing::debug!(request_id = %request_id, update_id, "Webhook update received");

    if let Err(e) = state.runtime.handle_update(update).await {
        tracing::error!(
            request_id = %request_id,
            update_id,
            error = %e,
            "Failed to handle webhook update"
        );
    }

    Ok(StatusCode::OK)
}
