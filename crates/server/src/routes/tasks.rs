use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    progress::UserProgress,
    task::{CreateTask, Task, TaskOrder, TaskStatus, UpdateTask},
};
use serde::Deserialize;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, auth::AuthUser, error::ApiError};

/// GET /api/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = Task::find_by_user_id(&state.db().pool, user.id).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

/// POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    axum::Json(payload): axum::Json<CreateTask>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Task>>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".into()));
    }

    let task = Task::create(&state.db().pool, user.id, &payload, Uuid::new_v4()).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(task)),
    ))
}

/// GET /api/tasks/{task_id}
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(task_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = Task::find_by_id(&state.db().pool, task_id, user.id)
        .await?
        .ok_or(ApiError::NotFound("task"))?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

/// PUT /api/tasks/{task_id}
///
/// Completing a task (transition into `done`) awards progress XP;
/// re-saving an already-done task does not.
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(task_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let existing = Task::find_by_id(&state.db().pool, task_id, user.id)
        .await?
        .ok_or(ApiError::NotFound("task"))?;

    let task = Task::update(&state.db().pool, task_id, user.id, &payload)
        .await?
        .ok_or(ApiError::NotFound("task"))?;

    if payload.status == Some(TaskStatus::Done) && existing.status != TaskStatus::Done {
        let progress = UserProgress::award_task_completion(&state.db().pool, user.id).await?;
        tracing::debug!(
            user_id = %user.id,
            xp = progress.xp,
            level = progress.level,
            "task completion awarded"
        );
    }

    Ok(ResponseJson(ApiResponse::success(task)))
}

/// DELETE /api/tasks/{task_id}
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(task_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = Task::delete(&state.db().pool, task_id, user.id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("task"));
    }
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Task deleted",
    )))
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub tasks: Vec<TaskOrder>,
}

/// POST /api/tasks/reorder
pub async fn reorder_tasks(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    axum::Json(payload): axum::Json<ReorderRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    Task::reorder(&state.db().pool, user.id, &payload.tasks).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Order updated",
    )))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/tasks",
        Router::new()
            .route("/", get(list_tasks).post(create_task))
            .route("/reorder", post(reorder_tasks))
            .route(
                "/{task_id}",
                get(get_task).put(update_task).delete(delete_task),
            ),
    )
}
