use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DiscoverError;

/// Which strategy produced a cost estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostSource {
    Llm,
    Rule,
    Fallback,
}

/// A recipe search hit moving through the discovery funnel.
///
/// The url is the identity key: every merge point deduplicates on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecipe {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source_domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Positive, at most 50. Back-filled from text heuristics or extraction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    /// Computed per request; never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_source: Option<CostSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_cost: Option<DetailedCost>,
}

impl CandidateRecipe {
    /// Build a bare candidate; optional fields start unset.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
        source_domain: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
            source_domain: source_domain.into(),
            image_url: None,
            servings: None,
            estimated_cost: None,
            cost_source: None,
            detailed_cost: None,
        }
    }

    /// Strip volatile cost fields so estimates never go stale in storage.
    pub fn without_cost_fields(mut self) -> Self {
        self.estimated_cost = None;
        self.cost_source = None;
        self.detailed_cost = None;
        self
    }
}

/// A parsed ingredient line. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    /// Raw quantity token; may be a fraction string like "1/2".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Per-ingredient cost breakdown for a single recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedCost {
    pub total_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_serving: Option<f64>,
    pub breakdown: Vec<CostLine>,
}

/// One costed ingredient line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub cost: f64,
    /// Label of the price source that resolved this line.
    pub source_label: String,
}

/// One cached fanout round, stored stripped of volatile cost fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub items: Vec<CandidateRecipe>,
    pub updated_at: DateTime<Utc>,
}

/// Optional spending ceiling; absence means unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BudgetQuery(pub Option<f64>);

impl BudgetQuery {
    /// Parse raw user input. Empty means unconstrained; anything else must be
    /// a positive number (a `$` prefix/suffix and a decimal comma are fine).
    pub fn parse(raw: &str) -> Result<Self, DiscoverError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self(None));
        }
        let cleaned = trimmed
            .trim_start_matches('$')
            .trim_end_matches('$')
            .trim()
            .replace(',', ".");
        let value: f64 = cleaned
            .parse()
            .map_err(|_| DiscoverError::InvalidBudget(raw.to_string()))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(DiscoverError::InvalidBudget(raw.to_string()));
        }
        Ok(Self(Some(value)))
    }
}

/// One discovery request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<String>,
    /// Raw budget input; empty means unconstrained.
    #[serde(default)]
    pub budget: String,
}

/// Result of one discovery run.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryResult {
    pub recipes: Vec<CandidateRecipe>,
    pub cache_key: String,
    /// True when the result was served entirely from cache.
    pub from_cache: bool,
    /// True when a fanout round ran and its results were written back.
    pub cache_enriched: bool,
}

/// Which extraction strategy produced the ingredient list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    StructuredData,
    MarkupPattern,
}

/// Output of the on-demand single-recipe extraction path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedRecipe {
    pub ingredients: Vec<Ingredient>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    pub source: String,
    pub method: ExtractionMethod,
}
