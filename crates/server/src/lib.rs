pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use axum::{Router, routing::get};
use db::DBService;
use services::services::{
    advice::AdviceService, assistant::AssistantService, chat_api::ChatApiClient,
    fetch::FetchGateway, meals::MealService, recommend::RecipeRecommender,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use utils::response::ApiResponse;

use crate::{config::Config, error::ApiError};

/// Everything a handler needs, built once at startup from [`Config`] and
/// cloned into the router. The chat client is optional: without an API
/// key the AI routes answer with a configuration error instead of the
/// process refusing to start.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    advice: AdviceService,
    meals: MealService,
    assistant: Option<AssistantService>,
    recommender: Option<RecipeRecommender>,
}

impl AppState {
    pub fn new(config: &Config, db: DBService) -> anyhow::Result<Self> {
        let gateway = FetchGateway::new()?;
        let advice = AdviceService::new(gateway.clone(), config.advice_api_base.clone());
        let meals = MealService::new(gateway, config.mealdb_api_base.clone());

        let chat = match &config.groq_api_key {
            Some(key) => Some(ChatApiClient::new(
                key.clone(),
                config.groq_api_base.clone(),
                config.groq_model.clone(),
            )?),
            None => {
                warn!("GROQ_API_KEY is not set; AI routes are disabled");
                None
            }
        };
        let assistant = chat.clone().map(AssistantService::new);
        let recommender = chat.map(|chat| RecipeRecommender::new(chat, meals.clone()));

        Ok(Self {
            db,
            advice,
            meals,
            assistant,
            recommender,
        })
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn advice(&self) -> &AdviceService {
        &self.advice
    }

    pub fn meals(&self) -> &MealService {
        &self.meals
    }

    pub fn assistant(&self) -> Result<&AssistantService, ApiError> {
        self.assistant
            .as_ref()
            .ok_or(ApiError::AssistantUnavailable)
    }

    pub fn recommender(&self) -> Result<&RecipeRecommender, ApiError> {
        self.recommender
            .as_ref()
            .ok_or(ApiError::AssistantUnavailable)
    }
}

async fn health() -> axum::Json<ApiResponse<&'static str>> {
    axum::Json(ApiResponse::success("ok"))
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::auth::router())
        .merge(routes::tasks::router())
        .merge(routes::notes::router())
        .merge(routes::advice::router())
        .merge(routes::food::router())
        .merge(routes::ai::router())
        .merge(routes::profile::router());

    Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
