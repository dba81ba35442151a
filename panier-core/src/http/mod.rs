//! HTTP fetch layer: client trait, production client, mock, rate limiting.

mod client;
mod rate_limiter;

pub use client::{HttpClient, MockClient, MockResponse, ReqwestClient};
pub use rate_limiter::RateLimiter;

/// Fixed timeout for page and robots fetches, in seconds.
pub const FETCH_TIMEOUT_SECS: u64 = 8;
