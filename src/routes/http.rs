//! HTTP endpoint handlers. Thin wrappers; the interesting state lives in WebSocket sessions.

use std::sync::Arc;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::{error, instrument};

use crate::protocol::*;
use crate::service::QuizService;
use crate::session::HISTORY_FAILURE_MESSAGE;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

/// Proxy of the service's quiz list, for the history table.
#[instrument(level = "info", skip(state))]
pub async fn http_list_quizzes(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  match state.service.list_quizzes().await {
    Ok(records) => Json(records).into_response(),
    Err(e) => {
      error!(target: "quiz", error = %e, "HTTP quiz history failed");
      (StatusCode::BAD_GATEWAY, Json(ErrorOut { message: HISTORY_FAILURE_MESSAGE.into() })).into_response()
    }
  }
}
