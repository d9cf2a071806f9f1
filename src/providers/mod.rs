// =============================================================================
// Provider Clients (C1)
// =============================================================================
//
// Narrow, typed async interfaces for each data kind. Every client reports
// failures as a typed outcome rather than panicking or returning an implicit
// zero — callers (the router, C2) decide how to interpret each variant.

pub mod binance_ohlcv;
pub mod generic_rest;
pub mod rate_limit;
pub mod symbol_alias;

use async_trait::async_trait;

use crate::types::{Coin, Derivatives, FilterScope, LlmRefinement, OnChain, Options, OhlcvSeries, Sentiment, Timeframe};

/// Typed result of a single provider call. Never collapses to a bare `Err` —
/// the router branches on each variant differently (§4.2).
#[derive(Debug, Clone)]
pub enum ProviderOutcome<T> {
    Ok(T),
    RateLimited { reset_hint: Option<std::time::Duration> },
    TransientError { reason: String },
    PermanentError { reason: String },
    Unsupported,
}

impl<T> ProviderOutcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, ProviderOutcome::Ok(_))
    }
}

#[async_trait]
pub trait OhlcvClient: Send + Sync {
    fn id(&self) -> &str;
    async fn top_coins(
        &self,
        limit: u32,
        scope: FilterScope,
        min_price: Option<f64>,
        max_price: Option<f64>,
    ) -> ProviderOutcome<Vec<Coin>>;
    async fn ohlcv(&self, symbol: &str, timeframe: Timeframe, depth: u32) -> ProviderOutcome<OhlcvSeries>;
}

#[async_trait]
pub trait DerivativesClient: Send + Sync {
    fn id(&self) -> &str;
    async fn derivs(&self, symbol: &str) -> ProviderOutcome<Derivatives>;
}

#[async_trait]
pub trait OptionsClient: Send + Sync {
    fn id(&self) -> &str;
    async fn options(&self, symbol: &str) -> ProviderOutcome<Options>;
}

#[async_trait]
pub trait OnChainClient: Send + Sync {
    fn id(&self) -> &str;
    async fn onchain(&self, symbol: &str) -> ProviderOutcome<OnChain>;
}

#[async_trait]
pub trait SentimentClient: Send + Sync {
    fn id(&self) -> &str;
    async fn sentiment(&self, symbol: &str) -> ProviderOutcome<Sentiment>;
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    fn id(&self) -> &str;
    async fn analyze(&self, prompt: &str) -> ProviderOutcome<LlmRefinement>;
}
