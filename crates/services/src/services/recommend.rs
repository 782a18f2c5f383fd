//! AI recipe recommendations: the model turns a free-text craving into
//! search terms, then TheMealDB is queried concurrently for each term.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::chat_api::{ChatApiClient, ChatApiError, extract_json};
use super::meals::{Meal, MealService, SearchKind};

const MAX_RESULTS: usize = 20;
const MAX_TERM_SEARCHES: usize = 3;
const MAX_INGREDIENT_SEARCHES: usize = 2;

const EXTRACTION_SYSTEM: &str = "You are a food recommendation assistant. Analyze the user's food request and extract:\n\
1. Main ingredients (comma-separated, max 3 most important)\n\
2. Meal type/category (e.g., Breakfast, Dessert, Side, etc.)\n\
3. Dietary preferences (e.g., Vegetarian, Vegan, Gluten Free, etc.)\n\
4. Cooking style (e.g., Quick, Healthy, Comfort Food, etc.)\n\n\
Respond ONLY in this exact JSON format:\n\
{\"ingredients\": [\"ingredient1\", \"ingredient2\"], \"category\": \"category_name\", \"dietary\": \"preference\", \"style\": \"style_name\", \"searchTerms\": [\"term1\", \"term2\", \"term3\"]}\n\n\
If a field is not mentioned, use null. Keep searchTerms to 1-3 most relevant keywords for the recipe search.";

/// What the model extracted from the user's description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSearchPlan {
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub dietary: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub search_terms: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub meals: Vec<Meal>,
    pub plan: RecipeSearchPlan,
    pub analysis: String,
}

#[derive(Debug, Clone)]
pub struct RecipeRecommender {
    chat: ChatApiClient,
    meals: MealService,
}

impl RecipeRecommender {
    pub fn new(chat: ChatApiClient, meals: MealService) -> Self {
        Self { chat, meals }
    }

    pub async fn recommend(&self, description: &str) -> Result<Recommendation, ChatApiError> {
        let analysis = self
            .chat
            .complete(
                vec![
                    super::chat_api::Message::system(EXTRACTION_SYSTEM),
                    super::chat_api::Message::user(format!("Find recipes for: {description}")),
                ],
                300,
                Some(0.7),
            )
            .await?
            .text()
            .map(str::to_string)
            .unwrap_or_default();

        let plan = match serde_json::from_str::<RecipeSearchPlan>(extract_json(&analysis)) {
            Ok(plan) => plan,
            Err(e) => {
                warn!(error = %e, "could not parse extraction, searching the raw description");
                RecipeSearchPlan {
                    search_terms: Some(vec![description.to_string()]),
                    ..Default::default()
                }
            }
        };

        let mut meals = self.run_searches(&plan).await;

        // Broader net when the targeted searches came up dry.
        if meals.is_empty() {
            if let Some(first_word) = description.split_whitespace().next() {
                match self.meals.search(SearchKind::Name, first_word).await {
                    Ok(found) => meals.extend(found.into_iter().take(10)),
                    Err(e) => warn!(error = %e, "fallback search failed"),
                }
            }
        }

        meals.truncate(MAX_RESULTS);

        Ok(Recommendation {
            meals,
            plan,
            analysis,
        })
    }

    /// Run every planned search concurrently and merge the hits, deduped
    /// by meal id in arrival order. A failed search only loses its own
    /// slot.
    async fn run_searches(&self, plan: &RecipeSearchPlan) -> Vec<Meal> {
        let mut searches = Vec::new();

        if let Some(terms) = &plan.search_terms {
            for term in terms.iter().take(MAX_TERM_SEARCHES) {
                searches.push(self.meals.search(SearchKind::Name, term));
            }
        }
        if let Some(ingredients) = &plan.ingredients {
            for ingredient in ingredients.iter().take(MAX_INGREDIENT_SEARCHES) {
                searches.push(self.meals.search(SearchKind::Ingredient, ingredient));
            }
        }
        if let Some(category) = &plan.category {
            searches.push(self.meals.search(SearchKind::Category, category));
        }

        let mut merged: Vec<Meal> = Vec::new();
        for result in futures::future::join_all(searches).await {
            match result {
                Ok(found) => {
                    for meal in found {
                        if !merged.iter().any(|m| m.id == meal.id) {
                            merged.push(meal);
                        }
                    }
                }
                Err(e) => warn!(error = %e, "recommendation search failed"),
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_tolerates_null_fields() {
        let plan: RecipeSearchPlan = serde_json::from_str(
            r#"{"ingredients": null, "category": "Dessert", "dietary": null, "style": null, "searchTerms": ["cake"]}"#,
        )
        .unwrap();
        assert_eq!(plan.category.as_deref(), Some("Dessert"));
        assert_eq!(plan.search_terms.unwrap(), vec!["cake"]);
        assert!(plan.ingredients.is_none());
    }
}
