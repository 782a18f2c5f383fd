//! TheMealDB client: random recipes, search, lookup, categories.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use url::Url;

use super::fetch::{self, FetchError, FetchGateway, FetchPolicy};

pub const THEMEALDB_API: &str = "https://www.themealdb.com/api/json/v1/1";

/// Hard ceiling on fan-out width per incoming request.
pub const RANDOM_CAP: u32 = 20;

const PER_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 3;

/// A recipe. The typed fields are the ones the product reads; everything
/// else TheMealDB sends (`strIngredient1..20`, `strMeasure1..20`, …) rides
/// along in `extra` so clients keep the full payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    #[serde(rename = "idMeal")]
    pub id: String,
    #[serde(rename = "strMeal")]
    pub name: String,
    #[serde(rename = "strCategory", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "strArea", skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(rename = "strInstructions", skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(rename = "strMealThumb", skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(rename = "strTags", skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(rename = "strYoutube", skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// TheMealDB answers `{"meals": null}` when nothing matches.
#[derive(Debug, Deserialize)]
struct MealsResponse {
    #[serde(default)]
    meals: Option<Vec<Meal>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealCategory {
    #[serde(rename = "idCategory")]
    pub id: String,
    #[serde(rename = "strCategory")]
    pub name: String,
    #[serde(rename = "strCategoryThumb", skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(
        rename = "strCategoryDescription",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    categories: Vec<MealCategory>,
}

/// Which TheMealDB endpoint a search goes through.
#[derive(Debug, Clone, Copy, PartialEq, EnumString, Display, Default)]
#[strum(serialize_all = "lowercase")]
pub enum SearchKind {
    #[default]
    Name,
    Ingredient,
    Category,
}

#[derive(Debug, Clone)]
pub struct MealService {
    gateway: FetchGateway,
    base_url: Url,
}

impl MealService {
    pub fn new(gateway: FetchGateway, base_url: Url) -> Self {
        Self {
            gateway,
            base_url: fetch::base_url(base_url),
        }
    }

    fn policy(&self) -> FetchPolicy {
        FetchPolicy::new(MAX_ATTEMPTS, PER_ATTEMPT_TIMEOUT)
    }

    /// Up to `count` random recipes (clamped to [`RANDOM_CAP`]) fetched
    /// concurrently; each slot is an independent retried call against the
    /// randomizing endpoint, so duplicates are possible and failed slots
    /// just shrink the batch.
    pub async fn random(&self, count: u32) -> Result<Vec<Meal>, FetchError> {
        let url = self.base_url.join("random.php")?;
        let policy = self.policy();

        let responses = self
            .gateway
            .fan_out_json::<MealsResponse>(&url, &policy, count, RANDOM_CAP)
            .await;

        Ok(responses
            .into_iter()
            .filter_map(|r| r.meals.and_then(|meals| meals.into_iter().next()))
            .collect())
    }

    pub async fn search(&self, kind: SearchKind, query: &str) -> Result<Vec<Meal>, FetchError> {
        let (endpoint, param) = match kind {
            SearchKind::Name => ("search.php", "s"),
            SearchKind::Ingredient => ("filter.php", "i"),
            SearchKind::Category => ("filter.php", "c"),
        };
        let mut url = self.base_url.join(endpoint)?;
        url.query_pairs_mut().append_pair(param, query);

        let response: MealsResponse = self.gateway.get_json(&url, &self.policy()).await?;
        Ok(response.meals.unwrap_or_default())
    }

    pub async fn lookup(&self, id: &str) -> Result<Option<Meal>, FetchError> {
        let mut url = self.base_url.join("lookup.php")?;
        url.query_pairs_mut().append_pair("i", id);

        let response: MealsResponse = self.gateway.get_json(&url, &self.policy()).await?;
        Ok(response.meals.and_then(|meals| meals.into_iter().next()))
    }

    pub async fn categories(&self) -> Result<Vec<MealCategory>, FetchError> {
        let url = self.base_url.join("categories.php")?;
        let response: CategoriesResponse = self.gateway.get_json(&url, &self.policy()).await?;
        Ok(response.categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn meal_body(id: &str, name: &str) -> serde_json::Value {
        serde_json::json!({
            "meals": [{
                "idMeal": id,
                "strMeal": name,
                "strCategory": "Dessert",
                "strMealThumb": "https://example.com/thumb.jpg",
                "strIngredient1": "Sugar",
                "strMeasure1": "1 cup"
            }]
        })
    }

    async fn service(server: &MockServer) -> MealService {
        MealService::new(
            FetchGateway::new().unwrap(),
            Url::parse(&server.uri()).unwrap(),
        )
    }

    #[tokio::test]
    async fn random_takes_the_first_meal_of_each_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/random.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(meal_body("52772", "Teriyaki")))
            .expect(2)
            .mount(&server)
            .await;

        let meals = service(&server).await.random(2).await.unwrap();

        assert_eq!(meals.len(), 2);
        assert_eq!(meals[0].id, "52772");
        // Untyped upstream fields survive the round trip.
        assert_eq!(meals[0].extra["strIngredient1"], "Sugar");
    }

    #[tokio::test]
    async fn search_routes_each_kind_to_its_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/filter.php"))
            .and(query_param("i", "chicken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(meal_body("123", "Chicken")))
            .mount(&server)
            .await;

        let meals = service(&server)
            .await
            .search(SearchKind::Ingredient, "chicken")
            .await
            .unwrap();

        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].name, "Chicken");
    }

    #[tokio::test]
    async fn null_meals_is_an_empty_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"meals": null})))
            .mount(&server)
            .await;

        let svc = service(&server).await;
        assert!(svc.search(SearchKind::Name, "xyzzy").await.unwrap().is_empty());
        assert!(svc.lookup("0").await.unwrap().is_none());
    }

    #[test]
    fn search_kind_parses_query_values() {
        assert_eq!("ingredient".parse::<SearchKind>().unwrap(), SearchKind::Ingredient);
        assert_eq!("name".parse::<SearchKind>().unwrap(), SearchKind::Name);
        assert!("bogus".parse::<SearchKind>().is_err());
    }
}
