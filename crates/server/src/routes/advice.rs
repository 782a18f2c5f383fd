use axum::{
    Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use serde::Deserialize;
use services::services::advice::{Advice, RANDOM_CAP};
use utils::response::ApiResponse;

use crate::{AppState, auth::AuthUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct AdviceQuery {
    pub count: Option<u32>,
    pub search: Option<String>,
}

/// GET /api/advice?count=&search=
///
/// Without `search`, fans out `count` independent retried calls (capped
/// at 5). Partial upstream failure only shortens the list; a fully failed
/// batch becomes 503.
pub async fn get_advice(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<AdviceQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Advice>>>, ApiError> {
    let count = query.count.unwrap_or(1);

    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match search {
        Some(search) => {
            let advices = state.advice().search(search, count.min(RANDOM_CAP)).await?;
            Ok(ResponseJson(ApiResponse::success(advices)))
        }
        None => {
            let advices = state.advice().random(count).await?;
            if advices.is_empty() {
                return Err(ApiError::UpstreamUnavailable(
                    "No advice available at the moment. Please try again later.",
                ));
            }
            Ok(ResponseJson(ApiResponse::success(advices)))
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/advice", get(get_advice))
}
