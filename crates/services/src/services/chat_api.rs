//! Groq chat-completions client backing the assistant features.
//!
//! Built once at process start from configuration and threaded through
//! application state; never constructed ad hoc at a call site.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use super::fetch::{self, FetchPolicy};

pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

#[derive(Debug, Clone, Error)]
pub enum ChatApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("json error: {0}")]
    Serde(String),
}

impl ChatApiError {
    /// Transient failures worth another attempt.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice, if the model produced any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct ChatApiClient {
    http: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    retry_policy: FetchPolicy,
}

impl ChatApiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
    const MAX_ATTEMPTS: u32 = 3;

    pub fn new(
        api_key: String,
        base_url: Url,
        model: Option<String>,
    ) -> Result<Self, ChatApiError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("pom-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatApiError::Transport(e.to_string()))?;

        let endpoint = fetch::base_url(base_url)
            .join("chat/completions")
            .map_err(|e| ChatApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            endpoint,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            retry_policy: FetchPolicy::new(Self::MAX_ATTEMPTS, Self::REQUEST_TIMEOUT),
        })
    }

    /// Shorten the retry pauses; test hook.
    pub fn with_retry_policy(mut self, policy: FetchPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Send a completion request, retrying transient failures with linear
    /// backoff. Permanent errors (bad key, 4xx) fail fast.
    pub async fn complete(
        &self,
        messages: Vec<Message>,
        max_tokens: u32,
        temperature: Option<f32>,
    ) -> Result<ChatResponse, ChatApiError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens,
            temperature,
        };

        fetch::retry_if(
            &self.retry_policy,
            |_| self.send_request(&request),
            ChatApiError::should_retry,
        )
        .await
    }

    async fn send_request(&self, request: &ChatRequest) -> Result<ChatResponse, ChatApiError> {
        let res = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<ChatResponse>()
                .await
                .map_err(|e| ChatApiError::Serde(e.to_string())),
            StatusCode::UNAUTHORIZED => Err(ChatApiError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => Err(ChatApiError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(ChatApiError::Http { status, body })
            }
        }
    }

    /// Single user message with an optional system prompt; returns the
    /// completion text.
    pub async fn ask(
        &self,
        prompt: &str,
        system: Option<String>,
        max_tokens: u32,
    ) -> Result<String, ChatApiError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(prompt));

        let response = self.complete(messages, max_tokens, None).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or_else(|| ChatApiError::Serde("no text content in completion".to_string()))
    }

    /// Ask for JSON and parse it, tolerating prose around the object.
    pub async fn ask_json<T: for<'de> Deserialize<'de>>(
        &self,
        prompt: &str,
        system: Option<String>,
        max_tokens: u32,
    ) -> Result<T, ChatApiError> {
        let response = self.ask(prompt, system, max_tokens).await?;
        if response.trim().is_empty() {
            return Err(ChatApiError::Serde("empty completion".to_string()));
        }

        let json_str = extract_json(&response);
        serde_json::from_str(json_str).map_err(|e| {
            tracing::error!(
                json_error = %e,
                preview = %json_str.chars().take(200).collect::<String>(),
                "failed to parse JSON completion"
            );
            ChatApiError::Serde(e.to_string())
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ChatApiError {
    if e.is_timeout() {
        ChatApiError::Timeout
    } else {
        ChatApiError::Transport(e.to_string())
    }
}

/// Models wrap JSON in prose or code fences; take everything between the
/// first `{` and the last `}`.
pub fn extract_json(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end >= start => &text[start..=end],
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
        })
    }

    async fn client(server: &MockServer) -> ChatApiClient {
        ChatApiClient::new(
            "test-key".into(),
            Url::parse(&server.uri()).unwrap(),
            None,
        )
        .unwrap()
        .with_retry_policy(
            FetchPolicy::new(3, Duration::from_secs(5))
                .with_backoff_base(Duration::from_millis(10)),
        )
    }

    #[test]
    fn extract_json_finds_the_object_inside_prose() {
        assert_eq!(extract_json(r#"{"key": "value"}"#), r#"{"key": "value"}"#);
        assert_eq!(
            extract_json("Here you go:\n```json\n{\"key\": 1}\n```"),
            r#"{"key": 1}"#
        );
        assert_eq!(extract_json("no json here"), "no json here");
    }

    #[tokio::test]
    async fn ask_returns_the_first_choice_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("hello")))
            .mount(&server)
            .await;

        let text = client(&server).await.ask("hi", None, 100).await.unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("recovered")))
            .mount(&server)
            .await;

        let text = client(&server).await.ask("hi", None, 100).await.unwrap();
        assert_eq!(text, "recovered");
    }

    #[tokio::test]
    async fn invalid_key_fails_fast_without_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server).await.ask("hi", None, 100).await;
        assert!(matches!(result, Err(ChatApiError::InvalidApiKey)));
    }

    #[tokio::test]
    async fn ask_json_parses_fenced_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
                "Sure!\n```json\n{\"steps\": [\"a\", \"b\"]}\n```",
            )))
            .mount(&server)
            .await;

        #[derive(Deserialize)]
        struct Out {
            steps: Vec<String>,
        }

        let out: Out = client(&server).await.ask_json("hi", None, 100).await.unwrap();
        assert_eq!(out.steps, vec!["a", "b"]);
    }
}
