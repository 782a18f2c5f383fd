use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json as ResponseJson,
    routing::post,
};
use db::models::{
    preferences::UserPreferences,
    progress::UserProgress,
    session::AuthSession,
    user::{CreateUser, User},
};
use serde::{Deserialize, Serialize};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, auth, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<SignupRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<AuthResponse>>), ApiError> {
    let email = payload.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }
    if User::find_by_email(&state.db().pool, &email).await?.is_some() {
        return Err(ApiError::Conflict(
            "An account with this email already exists".into(),
        ));
    }

    let password_hash = auth::hash_password(&payload.password)?;
    let user = User::create(
        &state.db().pool,
        Uuid::new_v4(),
        &CreateUser {
            name: payload.name,
            email,
            password_hash: Some(password_hash),
        },
    )
    .await?;

    UserPreferences::ensure_defaults(&state.db().pool, user.id).await?;
    UserProgress::ensure_defaults(&state.db().pool, user.id).await?;

    let token = auth::create_session(&state.db().pool, user.id).await?;

    tracing::info!(user_id = %user.id, "new account created");

    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(AuthResponse { token, user })),
    ))
}

/// POST /api/auth/signin
pub async fn signin(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<SigninRequest>,
) -> Result<ResponseJson<ApiResponse<AuthResponse>>, ApiError> {
    let email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db().pool, &email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;
    let hash = user
        .password_hash
        .as_deref()
        .ok_or(ApiError::InvalidCredentials)?;
    if !auth::verify_password(&payload.password, hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let token = auth::create_session(&state.db().pool, user.id).await?;
    Ok(ResponseJson(ApiResponse::success(AuthResponse {
        token,
        user,
    })))
}

/// POST /api/auth/signout: deletes the presented session.
pub async fn signout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let token = auth::bearer_token(&headers).ok_or(ApiError::Unauthorized(
        "Missing or malformed Authorization header",
    ))?;
    AuthSession::delete(&state.db().pool, &auth::hash_token(token)).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Signed out",
    )))
}

/// POST /api/auth/forgot-password
///
/// Always answers with the same message so the endpoint cannot be used to
/// enumerate accounts.
pub async fn forgot_password(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<ForgotPasswordRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let email = payload.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    if let Some(user) = User::find_by_email(&state.db().pool, &email).await? {
        // Reset mail delivery is handled out of band; record the request.
        tracing::info!(user_id = %user.id, "password reset requested");
    }

    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "If an account exists with this email, you will receive a reset link.",
    )))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/auth",
        Router::new()
            .route("/signup", post(signup))
            .route("/signin", post(signin))
            .route("/signout", post(signout))
            .route("/forgot-password", post(forgot_password)),
    )
}
