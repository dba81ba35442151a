//! Core discovery pipeline for Panier, a meal-planning and grocery-budget
//! assistant.
//!
//! Given a user's ingredients, allergies, filter tags and budget, the pipeline
//! produces a bounded, cost-annotated, deduplicated set of recipe candidates:
//! cache lookup, multi-variant search fanout with pagination and early exit,
//! a content filtering funnel, bulk cost estimation and budget-constrained
//! selection with relaxation. A separate on-demand path extracts a single
//! recipe's ingredient list from its page and prices it per ingredient.
//!
//! External collaborators (search provider, cache store, unit price lookup,
//! text completion provider) sit behind narrow traits so deployments and
//! tests can substitute them freely.

pub mod budget;
pub mod cache;
pub mod cost;
pub mod error;
pub mod extract;
pub mod filters;
pub mod http;
pub mod ingredient_parser;
pub mod pipeline;
pub mod query_key;
pub mod search;
pub mod servings;
pub mod types;

pub use cache::{CacheOutcome, CacheStore, Clock, FixedClock, MemoryCacheStore, SystemClock};
pub use cost::{CostEstimate, CostEstimator};
pub use error::{DiscoverError, ExtractError, FetchError};
pub use http::{HttpClient, MockClient, MockResponse, ReqwestClient};
pub use pipeline::{DetailOutcome, Pipeline, PipelineConfig, RecipeDetail, RecipeDetailer};
pub use search::{MockSearchProvider, SearchClient, SearchHit, SearchProvider};
pub use types::{
    BudgetQuery, CacheEntry, CandidateRecipe, CostSource, DetailedCost, DiscoveryRequest,
    DiscoveryResult, ExtractedRecipe, ExtractionMethod, Ingredient,
};
