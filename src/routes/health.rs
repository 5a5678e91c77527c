use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let quiz_available = state.quiz_service.current_quiz().await.is_ok();
    let body = json!({
        "status": "ok",
        "quiz_available": quiz_available,
    });
    (StatusCode::OK, Json(body))
}
