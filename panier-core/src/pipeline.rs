//! Pipeline controller.
//!
//! One invocation handles one request: normalize the cache key, apply the
//! cache policy, fan out query variants when needed, dedupe, filter, cost and
//! select, then write the round back for the next request. Every network
//! failure along the way is soft; the only hard errors are input validation.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::sync::Arc;

use crate::budget;
use crate::cache::{self, CacheOutcome, CacheStore, Clock, SystemClock};
use crate::cost::{cost_recipe, CostEstimate, CostEstimator, UnitPriceLookup};
use crate::error::{DiscoverError, ExtractError};
use crate::extract;
use crate::filters::{self, FilterCriteria};
use crate::http::HttpClient;
use crate::query_key;
use crate::search::{SearchClient, SearchProvider};
use crate::types::{
    BudgetQuery, CandidateRecipe, CostSource, DetailedCost, DiscoveryRequest, DiscoveryResult,
    ExtractedRecipe,
};

/// Fanout exits early once this many unique candidates exist.
pub const FANOUT_TARGET_UNIQUE: usize = 35;

/// At most this many query variants beyond the base query.
pub const MAX_EXTRA_VARIANTS: usize = 8;

/// Variants issued concurrently per batch; the unique count is re-checked
/// between batches so early exit stays meaningful.
const FANOUT_BATCH: usize = 3;

/// Hits requested per variant (one page plus one paged continuation).
const HITS_PER_VARIANT: usize = 20;

/// A usable cache hit is sampled down to this many items.
pub const HIT_SAMPLE: usize = 20;

/// Tuning knobs for one pipeline instance.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Disallowed domains for the filtering funnel.
    pub blocked_domains: Vec<String>,
    /// Regional hint passed to the unit price lookup.
    pub region_hint: Option<String>,
    /// Seed for the selection RNG; None draws from entropy.
    pub rng_seed: Option<u64>,
}

/// The discovery pipeline.
pub struct Pipeline<P> {
    search: SearchClient<P>,
    cache: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    estimator: CostEstimator,
    config: PipelineConfig,
}

impl<P: SearchProvider> Pipeline<P> {
    pub fn new(
        provider: P,
        cache: Arc<dyn CacheStore>,
        estimator: CostEstimator,
        config: PipelineConfig,
    ) -> Self {
        Self {
            search: SearchClient::new(provider),
            cache,
            clock: Arc::new(SystemClock),
            estimator,
            config,
        }
    }

    /// Replace the time source; tests pin it to keep TTL checks
    /// deterministic.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Access the underlying search provider (mocks expose call logs).
    pub fn provider(&self) -> &P {
        self.search.provider()
    }

    /// Run one discovery request end to end.
    pub async fn discover(&self, request: &DiscoveryRequest) -> Result<DiscoveryResult, DiscoverError> {
        let budget = BudgetQuery::parse(&request.budget)?;
        let cache_key = query_key::normalize_key(
            &request.ingredients,
            request.budget.trim(),
            &request.allergies,
            &request.filters,
        );
        let mut rng = self.rng();

        let outcome = cache::lookup(self.cache.as_ref(), self.clock.as_ref(), &cache_key).await;

        let (seed, merge) = match outcome {
            CacheOutcome::Hit(mut items) => {
                tracing::info!(key = %cache_key, count = items.len(), "cache hit, skipping search");
                items.shuffle(&mut rng);
                items.truncate(HIT_SAMPLE);
                self.estimator.annotate_all(&mut items);
                let recipes = budget::select(items, budget, &mut rng);
                return Ok(DiscoveryResult {
                    recipes,
                    cache_key,
                    from_cache: true,
                    cache_enriched: false,
                });
            }
            CacheOutcome::Insufficient(items) => {
                tracing::info!(key = %cache_key, count = items.len(), "cache insufficient, enriching");
                (items, true)
            }
            CacheOutcome::Miss => (Vec::new(), false),
        };

        let candidates = self.fanout(request, seed).await;
        let criteria = FilterCriteria {
            blocked_domains: self.config.blocked_domains.clone(),
            allergies: request.allergies.clone(),
            filters: request.filters.clone(),
            meal_type: request.meal_type.clone(),
        };
        let mut kept = filters::apply_funnel(candidates, &criteria);
        tracing::debug!(key = %cache_key, kept = kept.len(), "funnel applied");

        self.estimator.annotate_all(&mut kept);
        let recipes = budget::select(kept.clone(), budget, &mut rng);

        cache::write(self.cache.as_ref(), self.clock.as_ref(), &cache_key, kept, merge).await;

        Ok(DiscoveryResult {
            recipes,
            cache_key,
            from_cache: false,
            cache_enriched: true,
        })
    }

    /// Issue query variants in small concurrent batches, deduping by url and
    /// exiting early once the unique target is reached.
    async fn fanout(
        &self,
        request: &DiscoveryRequest,
        seed: Vec<CandidateRecipe>,
    ) -> Vec<CandidateRecipe> {
        let mut seen: HashSet<String> = seed.iter().map(|c| c.url.clone()).collect();
        let mut unique = seed;

        let variants = build_query_variants(request);
        for batch in variants.chunks(FANOUT_BATCH) {
            if unique.len() >= FANOUT_TARGET_UNIQUE {
                break;
            }
            let pages = futures::future::join_all(
                batch
                    .iter()
                    .map(|query| self.search.search(query, HITS_PER_VARIANT)),
            )
            .await;
            for page in pages {
                for candidate in page {
                    if seen.insert(candidate.url.clone()) {
                        unique.push(candidate);
                    }
                }
            }
        }

        tracing::debug!(count = unique.len(), "fanout complete");
        unique
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }
}

/// Base query plus up to [`MAX_EXTRA_VARIANTS`] variants built from the meal
/// type, the selected filter tags and a few generic phrasings.
fn build_query_variants(request: &DiscoveryRequest) -> Vec<String> {
    let ingredients = request.ingredients.join(" ");
    let mut variants = vec![format!("recette {}", ingredients)];

    if let Some(meal) = &request.meal_type {
        variants.push(format!("recette {} {}", meal.trim(), ingredients));
    }
    for filter in &request.filters {
        variants.push(format!("recette {} {}", filter.trim(), ingredients));
    }
    for phrasing in [
        "recette facile",
        "recette rapide",
        "recette économique",
        "idée repas",
        "recette simple",
    ] {
        variants.push(format!("{} {}", phrasing, ingredients));
    }

    variants.truncate(1 + MAX_EXTRA_VARIANTS);
    variants
}

/// Result of the single-recipe detail path.
#[derive(Debug, Clone)]
pub struct RecipeDetail {
    pub extracted: ExtractedRecipe,
    pub detailed_cost: DetailedCost,
}

/// The detail path always returns something usable: either the extracted,
/// fully costed recipe, or a failure category paired with a fallback
/// estimate.
#[derive(Debug, Clone)]
pub enum DetailOutcome {
    Extracted(RecipeDetail),
    Degraded {
        kind: ExtractError,
        fallback: CostEstimate,
    },
}

/// On-demand single-recipe path: content extraction plus detailed
/// per-ingredient costing. Separate from [`Pipeline`] because it runs for
/// one selected recipe, never during bulk discovery.
pub struct RecipeDetailer {
    http: Arc<dyn HttpClient>,
    prices: Arc<dyn UnitPriceLookup>,
    estimator: CostEstimator,
    region_hint: Option<String>,
}

impl RecipeDetailer {
    pub fn new(
        http: Arc<dyn HttpClient>,
        prices: Arc<dyn UnitPriceLookup>,
        estimator: CostEstimator,
        region_hint: Option<String>,
    ) -> Self {
        Self {
            http,
            prices,
            estimator,
            region_hint,
        }
    }

    /// Extract and cost one recipe. A malformed url is a validation error;
    /// everything else degrades to a category plus a fallback estimate.
    pub async fn detail(
        &self,
        url: &str,
        title: &str,
        snippet: &str,
    ) -> Result<DetailOutcome, DiscoverError> {
        url::Url::parse(url).map_err(|e| DiscoverError::InvalidUrl(format!("{}: {}", url, e)))?;

        match extract::extract_recipe(self.http.as_ref(), url).await {
            Ok(extracted) => {
                let detailed_cost = cost_recipe(
                    &extracted.ingredients,
                    extracted.servings,
                    self.prices.as_ref(),
                    self.region_hint.as_deref(),
                )
                .await;
                Ok(DetailOutcome::Extracted(RecipeDetail {
                    extracted,
                    detailed_cost,
                }))
            }
            Err(kind) => {
                tracing::warn!(url, category = %kind, "extraction failed, returning fallback estimate");
                let mut fallback = self.estimator.estimate_rule(title, snippet);
                fallback.source = CostSource::Fallback;
                Ok(DetailOutcome::Degraded { kind, fallback })
            }
        }
    }
}
