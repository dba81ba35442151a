//! Two-strategy cost estimation with graceful degradation.
//!
//! The rule strategy is deterministic and always available; the LLM strategy
//! runs only when a provider key is configured, and any estimation error is
//! silently downgraded to the rule strategy — never surfaced to the caller.

pub mod detailed;
pub mod llm;
pub mod rule;

use serde::Serialize;

use crate::types::{CandidateRecipe, CostSource};

pub use detailed::{cost_recipe, PriceLookupError, UnitPrice, UnitPriceLookup};
pub use llm::{CompletionClient, LlmConfig, LlmError, LlmEstimator};

/// A cost estimate and the strategy that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostEstimate {
    pub estimated_cost: f64,
    pub source: CostSource,
}

/// Facade over the two estimation strategies.
pub struct CostEstimator {
    llm: Option<LlmEstimator>,
}

impl CostEstimator {
    pub fn new(llm: Option<LlmEstimator>) -> Self {
        Self { llm }
    }

    /// Rule-only estimator, for deployments without a provider key.
    pub fn rule_only() -> Self {
        Self { llm: None }
    }

    /// Build from environment; the LLM strategy is enabled only when a
    /// provider key is configured.
    pub fn from_env() -> Self {
        Self::new(LlmEstimator::from_env())
    }

    /// Estimate one recipe: LLM first when configured, falling back to the
    /// rule strategy on any estimation error.
    pub async fn estimate(&self, title: &str, snippet: &str) -> CostEstimate {
        if let Some(llm) = &self.llm {
            match llm.estimate(title, snippet).await {
                Ok(value) => {
                    return CostEstimate {
                        estimated_cost: value,
                        source: CostSource::Llm,
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "LLM estimate failed, using rule strategy");
                }
            }
        }
        self.estimate_rule(title, snippet)
    }

    /// Cheap deterministic estimate, used for bulk discovery.
    pub fn estimate_rule(&self, title: &str, snippet: &str) -> CostEstimate {
        CostEstimate {
            estimated_cost: rule::estimate(&format!("{} {}", title, snippet)),
            source: CostSource::Rule,
        }
    }

    /// Annotate a whole candidate list with the cheap strategy.
    pub fn annotate_all(&self, candidates: &mut [CandidateRecipe]) {
        for candidate in candidates.iter_mut() {
            let estimate = self.estimate_rule(&candidate.title, &candidate.snippet);
            candidate.estimated_cost = Some(estimate.estimated_cost);
            candidate.cost_source = Some(estimate.source);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FixedCompletion(String);

    #[async_trait]
    impl CompletionClient for FixedCompletion {
        async fn complete(
            &self,
            _prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, LlmError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenCompletion;

    #[async_trait]
    impl CompletionClient for BrokenCompletion {
        async fn complete(
            &self,
            _prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, LlmError> {
            Err(LlmError::Api("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_llm_estimate_used_when_parsable() {
        let estimator = CostEstimator::new(Some(LlmEstimator::new(Arc::new(FixedCompletion(
            "environ 23,50".to_string(),
        )))));
        let estimate = estimator.estimate("Saumon grillé", "Un saumon").await;
        assert_eq!(estimate.source, CostSource::Llm);
        assert!((estimate.estimated_cost - 23.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_api_error_downgrades_to_rule() {
        let estimator = CostEstimator::new(Some(LlmEstimator::new(Arc::new(BrokenCompletion))));
        let estimate = estimator.estimate("Saumon grillé", "Un saumon").await;
        assert_eq!(estimate.source, CostSource::Rule);
        assert!((estimate.estimated_cost - 18.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_garbage_completion_downgrades_to_rule() {
        let estimator = CostEstimator::new(Some(LlmEstimator::new(Arc::new(FixedCompletion(
            "je ne sais pas".to_string(),
        )))));
        let estimate = estimator.estimate("Saumon grillé", "Un saumon").await;
        assert_eq!(estimate.source, CostSource::Rule);
    }

    #[test]
    fn test_annotate_all_uses_rule_strategy() {
        let estimator = CostEstimator::rule_only();
        let mut candidates = vec![CandidateRecipe::new(
            "Pâtes au beurre",
            "https://x.test/p",
            "Des pâtes simples",
            "x.test",
        )];
        estimator.annotate_all(&mut candidates);
        assert_eq!(candidates[0].cost_source, Some(CostSource::Rule));
        assert!(candidates[0].estimated_cost.is_some());
    }
}
