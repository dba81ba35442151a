//! Search provider client: pagination, timeouts, soft failures.
//!
//! The transport is a narrow trait over "text query → list of hits"; this
//! client owns the per-call timeout, the one-extra-page rule and the mapping
//! of raw hits into candidates. It never raises to its caller: any failure
//! collapses to an empty list for that call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

use crate::servings::parse_servings;
use crate::types::CandidateRecipe;

/// Provider calls return at most this many hits.
pub const PAGE_SIZE: usize = 10;

/// Fixed timeout for one provider call, in seconds.
pub const SEARCH_TIMEOUT_SECS: u64 = 8;

/// One raw hit from the search provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl SearchHit {
    pub fn new(title: impl Into<String>, url: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
            thumbnail: None,
        }
    }
}

#[derive(Error, Debug)]
#[error("search provider error: {0}")]
pub struct SearchProviderError(pub String);

/// Transport seam over the external search provider.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Fetch one result page starting at `offset`. `count` is capped at the
    /// provider page size.
    async fn search_page(
        &self,
        query: &str,
        count: usize,
        offset: usize,
    ) -> Result<Vec<SearchHit>, SearchProviderError>;
}

/// Client wrapper owning timeout, pagination and hit mapping.
pub struct SearchClient<P> {
    provider: P,
    timeout: Duration,
}

impl<P: SearchProvider> SearchClient<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(SEARCH_TIMEOUT_SECS),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run one logical search for up to `count` hits.
    ///
    /// A `count` above the page size issues exactly one extra page, and only
    /// when the first page came back full; a failed second page is swallowed
    /// and the first page is still returned.
    pub async fn search(&self, query: &str, count: usize) -> Vec<CandidateRecipe> {
        let mut hits = self.page(query, count.min(PAGE_SIZE), 0).await;
        if count > PAGE_SIZE && hits.len() == PAGE_SIZE {
            hits.extend(self.page(query, count - PAGE_SIZE, PAGE_SIZE).await);
        }
        hits.into_iter().filter_map(map_hit).collect()
    }

    /// One provider call under its own timeout. Timeout and provider errors
    /// are logged and become an empty page.
    async fn page(&self, query: &str, count: usize, offset: usize) -> Vec<SearchHit> {
        match tokio::time::timeout(self.timeout, self.provider.search_page(query, count, offset))
            .await
        {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                tracing::warn!(query, offset, error = %e, "search call failed");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(query, offset, "search call timed out");
                Vec::new()
            }
        }
    }
}

/// Map a provider hit into a candidate, back-filling servings from the
/// title and snippet. Hits without a parsable host are dropped.
fn map_hit(hit: SearchHit) -> Option<CandidateRecipe> {
    let parsed = url::Url::parse(&hit.url).ok()?;
    let host = parsed.host_str()?;
    let source_domain = host.strip_prefix("www.").unwrap_or(host).to_string();
    let servings = parse_servings(&format!("{} {}", hit.title, hit.snippet));

    Some(CandidateRecipe {
        title: hit.title,
        url: hit.url,
        snippet: hit.snippet,
        source_domain,
        image_url: hit.thumbnail,
        servings,
        estimated_cost: None,
        cost_source: None,
        detailed_cost: None,
    })
}

/// Scriptable provider for tests: fixed pages per (query, offset), an
/// optional synthetic mode generating unique hits per call, and injectable
/// failures. Records every call it receives.
#[derive(Default)]
pub struct MockSearchProvider {
    pages: HashMap<(String, usize), Vec<SearchHit>>,
    synthetic_per_call: Option<usize>,
    fail_offsets: HashSet<usize>,
    fail_all: bool,
    counter: AtomicUsize,
    calls: Mutex<Vec<(String, usize, usize)>>,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `per_call` synthetic hits with unique urls on every call.
    pub fn synthetic(per_call: usize) -> Self {
        Self {
            synthetic_per_call: Some(per_call),
            ..Self::default()
        }
    }

    /// Fail every call.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// Serve a fixed page for (query, offset).
    pub fn with_page(mut self, query: &str, offset: usize, hits: Vec<SearchHit>) -> Self {
        self.pages.insert((query.to_string(), offset), hits);
        self
    }

    /// Fail any call at the given offset.
    pub fn failing_at_offset(mut self, offset: usize) -> Self {
        self.fail_offsets.insert(offset);
        self
    }

    /// Calls received so far, as (query, count, offset).
    pub fn calls(&self) -> Vec<(String, usize, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search_page(
        &self,
        query: &str,
        count: usize,
        offset: usize,
    ) -> Result<Vec<SearchHit>, SearchProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), count, offset));

        if self.fail_all || self.fail_offsets.contains(&offset) {
            return Err(SearchProviderError("injected failure".to_string()));
        }

        if let Some(hits) = self.pages.get(&(query.to_string(), offset)) {
            return Ok(hits.iter().take(count.min(PAGE_SIZE)).cloned().collect());
        }

        if let Some(per_call) = self.synthetic_per_call {
            let hits = (0..per_call.min(count).min(PAGE_SIZE))
                .map(|_| {
                    let id = self.counter.fetch_add(1, Ordering::Relaxed);
                    SearchHit::new(
                        format!("Recette maison {}", id),
                        format!("https://exemple.test/recette-{}", id),
                        format!("Une recette maison numéro {}", id),
                    )
                })
                .collect();
            return Ok(hits);
        }

        Ok(Vec::new())
    }
}
