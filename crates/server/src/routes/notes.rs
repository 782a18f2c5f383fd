use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::note::{CreateNote, Note, UpdateNote};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, auth::AuthUser, error::ApiError};

/// GET /api/notes
pub async fn list_notes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<ResponseJson<ApiResponse<Vec<Note>>>, ApiError> {
    let notes = Note::find_by_user_id(&state.db().pool, user.id).await?;
    Ok(ResponseJson(ApiResponse::success(notes)))
}

/// POST /api/notes
pub async fn create_note(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    axum::Json(payload): axum::Json<CreateNote>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Note>>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".into()));
    }

    let note = Note::create(&state.db().pool, user.id, &payload, Uuid::new_v4()).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(note)),
    ))
}

/// GET /api/notes/{note_id}
pub async fn get_note(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(note_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Note>>, ApiError> {
    let note = Note::find_by_id(&state.db().pool, note_id, user.id)
        .await?
        .ok_or(ApiError::NotFound("note"))?;
    Ok(ResponseJson(ApiResponse::success(note)))
}

/// PUT /api/notes/{note_id}
pub async fn update_note(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(note_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateNote>,
) -> Result<ResponseJson<ApiResponse<Note>>, ApiError> {
    let note = Note::update(&state.db().pool, note_id, user.id, &payload)
        .await?
        .ok_or(ApiError::NotFound("note"))?;
    Ok(ResponseJson(ApiResponse::success(note)))
}

/// DELETE /api/notes/{note_id}
pub async fn delete_note(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(note_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let deleted = Note::delete(&state.db().pool, note_id, user.id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("note"));
    }
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Note deleted",
    )))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/notes",
        Router::new()
            .route("/", get(list_notes).post(create_note))
            .route(
                "/{note_id}",
                get(get_note).put(update_note).delete(delete_note),
            ),
    )
}
