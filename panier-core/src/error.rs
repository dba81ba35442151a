use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Invalid response encoding: {0}")]
    InvalidEncoding(String),
}

/// Caller-facing categories for the on-demand single-recipe path.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractError {
    /// robots.txt carries a universal wildcard disallow.
    #[error("extraction blocked by robots policy")]
    PolicyBlocked,

    /// The source site answered with a non-success status or was unreachable.
    #[error("access denied by source site")]
    AccessDenied,

    #[error("source site timed out")]
    Timeout,

    /// The page fetched fine but no strategy found an ingredient list.
    #[error("no ingredient list found")]
    NoIngredients,
}

/// Validation errors surfaced directly to the caller, with no retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoverError {
    #[error("Invalid budget: {0}")]
    InvalidBudget(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
