use axum::{
    Router,
    extract::State,
    http::header,
    response::{IntoResponse, Json as ResponseJson},
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use db::models::{
    note::Note,
    preferences::{UpdatePreferences, UserPreferences},
    progress::UserProgress,
    task::Task,
    user::User,
};
use serde::{Deserialize, Serialize};
use utils::response::ApiResponse;

use crate::{AppState, auth::AuthUser, error::ApiError};

#[derive(Debug, Serialize)]
pub struct Profile {
    pub user: User,
    pub preferences: UserPreferences,
    pub progress: UserProgress,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    #[serde(flatten)]
    pub preferences: UpdatePreferences,
}

#[derive(Debug, Serialize)]
pub struct ExportData {
    pub user: User,
    pub tasks: Vec<Task>,
    pub notes: Vec<Note>,
    pub preferences: Option<UserPreferences>,
    pub progress: Option<UserProgress>,
    pub exported_at: DateTime<Utc>,
}

/// GET /api/profile
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<ResponseJson<ApiResponse<Profile>>, ApiError> {
    let pool = &state.db().pool;
    let preferences = UserPreferences::ensure_defaults(pool, user.id).await?;
    let progress = UserProgress::ensure_defaults(pool, user.id).await?;

    Ok(ResponseJson(ApiResponse::success(Profile {
        user,
        preferences,
        progress,
    })))
}

/// POST /api/profile/update: partial update of name and preferences.
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    axum::Json(payload): axum::Json<UpdateProfileRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = &state.db().pool;

    if let Some(name) = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
    {
        User::update_name(pool, user.id, name).await?;
    }

    UserPreferences::upsert(pool, user.id, &payload.preferences).await?;

    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Profile updated",
    )))
}

/// GET /api/profile/export: everything the user owns as a JSON download.
pub async fn export_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let pool = &state.db().pool;

    let (tasks, notes, preferences, progress) = tokio::try_join!(
        Task::find_by_user_id(pool, user.id),
        Note::find_by_user_id(pool, user.id),
        UserPreferences::find_by_user_id(pool, user.id),
        UserProgress::find_by_user_id(pool, user.id),
    )?;

    let data = ExportData {
        user,
        tasks,
        notes,
        preferences,
        progress,
        exported_at: Utc::now(),
    };

    let disposition = format!(
        "attachment; filename=\"pom-data-{}.json\"",
        data.exported_at.timestamp()
    );

    Ok((
        [(header::CONTENT_DISPOSITION, disposition)],
        ResponseJson(ApiResponse::success(data)),
    ))
}

/// DELETE /api/profile/delete: the account and, via cascade, everything
/// attached to it.
pub async fn delete_account(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    User::delete(&state.db().pool, user.id).await?;
    tracing::info!(user_id = %user.id, "account deleted");
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Account deleted",
    )))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/profile",
        Router::new()
            .route("/", get(get_profile))
            .route("/update", post(update_profile))
            .route("/export", get(export_profile))
            .route("/delete", delete(delete_account)),
    )
}
