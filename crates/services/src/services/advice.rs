//! Advice Slip lookups: random quotes for the dashboard card.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::fetch::{self, FetchError, FetchGateway, FetchPolicy};

pub const ADVICE_SLIP_API: &str = "https://api.adviceslip.com";

/// Hard ceiling on fan-out width per incoming request.
pub const RANDOM_CAP: u32 = 5;

const PER_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub advice: String,
}

/// Wire format of a single slip. Older deployments of the API send
/// `slip_id` as a string instead of a numeric `id`.
#[derive(Debug, Deserialize)]
struct Slip {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    slip_id: Option<String>,
    advice: String,
}

#[derive(Debug, Deserialize)]
struct SlipResponse {
    #[serde(default)]
    slip: Option<Slip>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    slips: Option<Vec<Slip>>,
}

impl From<Slip> for Advice {
    fn from(slip: Slip) -> Self {
        let id = slip
            .id
            .or_else(|| slip.slip_id.as_deref().and_then(|s| s.parse().ok()));
        Self {
            id,
            advice: slip.advice,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdviceService {
    gateway: FetchGateway,
    base_url: Url,
}

impl AdviceService {
    pub fn new(gateway: FetchGateway, base_url: Url) -> Self {
        Self {
            gateway,
            base_url: fetch::base_url(base_url),
        }
    }

    fn policy(&self) -> FetchPolicy {
        FetchPolicy::new(MAX_ATTEMPTS, PER_ATTEMPT_TIMEOUT)
    }

    /// Fetch up to `count` random slips (clamped to [`RANDOM_CAP`]) in one
    /// concurrent batch. Slots that exhaust their retries are simply
    /// missing from the result; an empty result means the whole batch
    /// failed.
    pub async fn random(&self, count: u32) -> Result<Vec<Advice>, FetchError> {
        let url = self.base_url.join("advice")?;
        let policy = self.policy();

        let responses = self
            .gateway
            .fan_out_json::<SlipResponse>(&url, &policy, count, RANDOM_CAP)
            .await;

        Ok(responses
            .into_iter()
            .filter_map(|r| r.slip)
            .map(Advice::from)
            .collect())
    }

    /// Full-text search, single retried call; at most `limit` results.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<Advice>, FetchError> {
        let url = self
            .base_url
            .join(&format!("advice/search/{}", urlencoding::encode(query)))?;

        let response: SearchResponse = self.gateway.get_json(&url, &self.policy()).await?;

        Ok(response
            .slips
            .unwrap_or_default()
            .into_iter()
            .take(limit as usize)
            .map(Advice::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn service(server: &MockServer) -> AdviceService {
        AdviceService::new(
            FetchGateway::new().unwrap(),
            Url::parse(&server.uri()).unwrap(),
        )
    }

    #[tokio::test]
    async fn random_collects_one_slip_per_slot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/advice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "slip": { "id": 42, "advice": "Drink some water." }
            })))
            .expect(3)
            .mount(&server)
            .await;

        let advices = service(&server).await.random(3).await.unwrap();

        assert_eq!(advices.len(), 3);
        assert_eq!(advices[0].id, Some(42));
        assert_eq!(advices[0].advice, "Drink some water.");
    }

    #[tokio::test]
    async fn search_limits_and_parses_string_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/advice/search/focus"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total_results": "3",
                "slips": [
                    { "slip_id": "10", "advice": "a" },
                    { "slip_id": "11", "advice": "b" },
                    { "slip_id": "12", "advice": "c" }
                ]
            })))
            .mount(&server)
            .await;

        let advices = service(&server).await.search("focus", 2).await.unwrap();

        assert_eq!(advices.len(), 2);
        assert_eq!(advices[0].id, Some(10));
    }

    #[tokio::test]
    async fn search_with_no_hits_is_an_empty_list_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "message": "no results" })),
            )
            .mount(&server)
            .await;

        let advices = service(&server).await.search("nothing", 5).await.unwrap();
        assert!(advices.is_empty());
    }
}
