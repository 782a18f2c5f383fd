use anyhow::Context;
use services::services::{advice::ADVICE_SLIP_API, chat_api::GROQ_API_BASE, meals::THEMEALDB_API};
use url::Url;

/// Process configuration, read once at startup. Everything that talks to
/// the outside world (database path, upstream bases, the LLM key) lives
/// here and is threaded through state, never read from the environment at
/// call sites.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub groq_api_key: Option<String>,
    pub groq_model: Option<String>,
    pub groq_api_base: Url,
    pub advice_api_base: Url,
    pub mealdb_api_base: Url,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().context("PORT must be a number")?,
            Err(_) => 3001,
        };

        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port,
            database_url: env_or("DATABASE_URL", "sqlite://pom.db"),
            groq_api_key: std::env::var("GROQ_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            groq_model: std::env::var("GROQ_MODEL").ok(),
            groq_api_base: env_url("GROQ_API_BASE", GROQ_API_BASE)?,
            advice_api_base: env_url("ADVICE_API_BASE", ADVICE_SLIP_API)?,
            mealdb_api_base: env_url("MEALDB_API_BASE", THEMEALDB_API)?,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_url(name: &str, default: &str) -> anyhow::Result<Url> {
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).with_context(|| format!("{name} is not a valid url"))
}
