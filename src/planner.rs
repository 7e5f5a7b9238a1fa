//! Plan-generation collaborator client.
//!
//! Generating a budget-fitting plan (recipe selection, pricing, allergen
//! filtering) happens in a hosted generator service; Mealsmith sends the
//! user's bearer token along and receives a complete [`MealPlan`] back.
//! Returned plans are untrusted input: the API layer validates their
//! structure and recomputes every rollup before persisting.

use serde::Serialize;

use crate::model::MealPlan;

/// Client for the hosted meal-plan generator.
#[derive(Clone)]
pub struct PlannerClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    regenerate: bool,
}

impl PlannerClient {
    /// Create a client for the given generator endpoint.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: &str) -> Self {
        Self::new(base_url)
    }

    /// Request a fresh plan for the authenticated user.
    pub async fn generate_plan(&self, token: &str) -> anyhow::Result<MealPlan> {
        let url = format!("{}/meal-plans/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&GenerateRequest { regenerate: true })
            .send()
            .await?
            .error_for_status()?;

        let plan = response.json::<MealPlan>().await?;
        Ok(plan)
    }
}
