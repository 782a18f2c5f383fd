use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use serde::Deserialize;
use services::services::{
    meals::{Meal, MealCategory, SearchKind},
    recommend::Recommendation,
};
use utils::response::ApiResponse;

use crate::{AppState, auth::AuthUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct RandomQuery {
    pub count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub description: String,
}

/// GET /api/food/random?count=
///
/// Fans out `count` independent retried calls (capped at 20) against the
/// randomizing endpoint; a shorter list than requested is fine, an empty
/// one is 503.
pub async fn random_meals(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<RandomQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Meal>>>, ApiError> {
    let meals = state.meals().random(query.count.unwrap_or(1)).await?;
    if meals.is_empty() {
        return Err(ApiError::UpstreamUnavailable(
            "No recipes available at the moment. Please try again later.",
        ));
    }
    Ok(ResponseJson(ApiResponse::success(meals)))
}

/// GET /api/food/search?q=&type=name|ingredient|category
pub async fn search_meals(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Meal>>>, ApiError> {
    let q = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Query parameter required".into()))?;

    let kind = match query.kind.as_deref() {
        None => SearchKind::Name,
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::BadRequest("type must be name, ingredient, or category".into()))?,
    };

    let meals = state.meals().search(kind, q).await?;
    Ok(ResponseJson(ApiResponse::success(meals)))
}

/// GET /api/food/categories
pub async fn meal_categories(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<ResponseJson<ApiResponse<Vec<MealCategory>>>, ApiError> {
    let categories = state.meals().categories().await?;
    Ok(ResponseJson(ApiResponse::success(categories)))
}

/// POST /api/food/ai-recommend
pub async fn ai_recommend(
    State(state): State<AppState>,
    _user: AuthUser,
    axum::Json(payload): axum::Json<RecommendRequest>,
) -> Result<ResponseJson<ApiResponse<Recommendation>>, ApiError> {
    let description = payload.description.trim();
    if description.is_empty() {
        return Err(ApiError::BadRequest("Description required".into()));
    }

    let recommendation = state.recommender()?.recommend(description).await?;
    Ok(ResponseJson(ApiResponse::success(recommendation)))
}

/// GET /api/food/{meal_id}
pub async fn get_meal(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(meal_id): Path<String>,
) -> Result<ResponseJson<ApiResponse<Meal>>, ApiError> {
    let meal = state
        .meals()
        .lookup(&meal_id)
        .await?
        .ok_or(ApiError::NotFound("recipe"))?;
    Ok(ResponseJson(ApiResponse::success(meal)))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/food",
        Router::new()
            .route("/random", get(random_meals))
            .route("/search", get(search_meals))
            .route("/categories", get(meal_categories))
            .route("/ai-recommend", post(ai_recommend))
            .route("/{meal_id}", get(get_meal)),
    )
}
