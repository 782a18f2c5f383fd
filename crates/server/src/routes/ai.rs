use axum::{Router, extract::State, response::Json as ResponseJson, routing::post};
use db::models::preferences::UserPreferences;
use serde::{Deserialize, Serialize};
use services::services::assistant::{ChatReply, TaskBreakdown};
use utils::response::ApiResponse;

use crate::{AppState, auth::AuthUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct BreakdownRequest {
    pub task: String,
}

#[derive(Debug, Deserialize)]
pub struct FocusPlanRequest {
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct FocusPlanResponse {
    pub advice: String,
}

/// POST /api/ai/chat
///
/// Personality comes from the user's stored preference; navigation intent
/// is decided locally, not by the model.
pub async fn chat(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    axum::Json(payload): axum::Json<ChatRequest>,
) -> Result<ResponseJson<ApiResponse<ChatReply>>, ApiError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message required".into()));
    }

    let assistant = state.assistant()?;
    let preferences = UserPreferences::ensure_defaults(&state.db().pool, user.id).await?;

    let reply = assistant
        .chat(user.display_name(), preferences.pom_personality, message)
        .await?;

    Ok(ResponseJson(ApiResponse::success(reply)))
}

/// POST /api/ai/task-breakdown
pub async fn task_breakdown(
    State(state): State<AppState>,
    _user: AuthUser,
    axum::Json(payload): axum::Json<BreakdownRequest>,
) -> Result<ResponseJson<ApiResponse<TaskBreakdown>>, ApiError> {
    let task = payload.task.trim();
    if task.is_empty() {
        return Err(ApiError::BadRequest("Task required".into()));
    }

    let breakdown = state.assistant()?.task_breakdown(task).await?;
    Ok(ResponseJson(ApiResponse::success(breakdown)))
}

/// POST /api/ai/focus-plan
pub async fn focus_plan(
    State(state): State<AppState>,
    _user: AuthUser,
    axum::Json(payload): axum::Json<FocusPlanRequest>,
) -> Result<ResponseJson<ApiResponse<FocusPlanResponse>>, ApiError> {
    let topic = payload.topic.trim();
    if topic.is_empty() {
        return Err(ApiError::BadRequest("Topic required".into()));
    }

    let advice = state.assistant()?.focus_plan(topic).await?;
    Ok(ResponseJson(ApiResponse::success(FocusPlanResponse {
        advice,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/ai",
        Router::new()
            .route("/chat", post(chat))
            .route("/task-breakdown", post(task_breakdown))
            .route("/focus-plan", post(focus_plan)),
    )
}
