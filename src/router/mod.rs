// =============================================================================
// Multi-Provider Router (C2)
// =============================================================================
//
// Holds an ordered list of clients per data kind and walks them with
// rate-limit skipping, per-call deadlines, single same-client retry on
// transient errors, and cooldown on rate-limited responses. Normalizes
// symbols through the alias table before every dispatch.

pub mod cooldown;

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::providers::symbol_alias::canonical_symbol;
use crate::providers::{
    DerivativesClient, LlmClient, OhlcvClient, OnChainClient, OptionsClient, ProviderOutcome,
    SentimentClient,
};
use crate::router::cooldown::CooldownTracker;
use crate::types::{Coin, Derivatives, FilterScope, LlmRefinement, OhlcvSeries, OnChain, Options, Sentiment, Timeframe};

const RETRY_JITTER_MIN_MS: u64 = 100;
const RETRY_JITTER_MAX_MS: u64 = 400;

/// What callers see when every registered client for a kind has failed.
/// Distinct from any per-client outcome so callers never mistake "no data"
/// for a zero value (§4.2).
#[derive(Debug, Clone)]
pub struct Unavailable {
    pub kind: &'static str,
    pub symbol: String,
}

async fn with_retry<T, F, Fut>(
    cooldowns: &CooldownTracker,
    client_id: &str,
    deadline: Duration,
    mut call: F,
) -> Option<ProviderOutcome<T>>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = ProviderOutcome<T>>,
{
    if cooldowns.is_cooling(client_id) {
        debug!(client_id, "skipping client, still cooling down");
        return None;
    }

    let first = match timeout(deadline, call()).await {
        Ok(outcome) => outcome,
        Err(_) => ProviderOutcome::TransientError { reason: "deadline exceeded".to_string() },
    };

    match first {
        ProviderOutcome::Ok(v) => Some(ProviderOutcome::Ok(v)),
        ProviderOutcome::RateLimited { reset_hint } => {
            let cooldown = reset_hint.unwrap_or_else(|| cooldowns.next_backoff(client_id));
            cooldowns.mark_cooling(client_id, cooldown);
            Some(ProviderOutcome::RateLimited { reset_hint: Some(cooldown) })
        }
        ProviderOutcome::TransientError { reason } => {
            let jitter = rand::thread_rng().gen_range(RETRY_JITTER_MIN_MS..=RETRY_JITTER_MAX_MS);
            tokio::time::sleep(Duration::from_millis(jitter)).await;
            let retried = match timeout(deadline, call()).await {
                Ok(outcome) => outcome,
                Err(_) => ProviderOutcome::TransientError { reason: "deadline exceeded on retry".to_string() },
            };
            if let ProviderOutcome::TransientError { reason: retry_reason } = &retried {
                warn!(client_id, reason, retry_reason, "transient error persisted after retry");
            }
            Some(retried)
        }
        other => Some(other),
    }
}

pub struct Router {
    ohlcv_clients: Vec<Arc<dyn OhlcvClient>>,
    derivs_clients: Vec<Arc<dyn DerivativesClient>>,
    options_clients: Vec<Arc<dyn OptionsClient>>,
    onchain_clients: Vec<Arc<dyn OnChainClient>>,
    sentiment_clients: Vec<Arc<dyn SentimentClient>>,
    llm_clients: Vec<Arc<dyn LlmClient>>,
    cooldowns: CooldownTracker,
}

impl Router {
    pub fn new() -> Self {
        Self {
            ohlcv_clients: Vec::new(),
            derivs_clients: Vec::new(),
            options_clients: Vec::new(),
            onchain_clients: Vec::new(),
            sentiment_clients: Vec::new(),
            llm_clients: Vec::new(),
            cooldowns: CooldownTracker::new(),
        }
    }

    pub fn with_ohlcv(mut self, client: Arc<dyn OhlcvClient>) -> Self {
        self.ohlcv_clients.push(client);
        self
    }

    pub fn with_derivs(mut self, client: Arc<dyn DerivativesClient>) -> Self {
        self.derivs_clients.push(client);
        self
    }

    pub fn with_options(mut self, client: Arc<dyn OptionsClient>) -> Self {
        self.options_clients.push(client);
        self
    }

    pub fn with_onchain(mut self, client: Arc<dyn OnChainClient>) -> Self {
        self.onchain_clients.push(client);
        self
    }

    pub fn with_sentiment(mut self, client: Arc<dyn SentimentClient>) -> Self {
        self.sentiment_clients.push(client);
        self
    }

    pub fn with_llm(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.llm_clients.push(client);
        self
    }

    pub async fn top_coins(
        &self,
        limit: u32,
        scope: FilterScope,
        min_price: Option<f64>,
        max_price: Option<f64>,
    ) -> Result<Vec<Coin>, Unavailable> {
        for client in &self.ohlcv_clients {
            let outcome = with_retry(&self.cooldowns, client.id(), Duration::from_secs(8), || {
                client.top_coins(limit, scope, min_price, max_price)
            })
            .await;
            if let Some(ProviderOutcome::Ok(coins)) = outcome {
                return Ok(coins);
            }
        }
        Err(Unavailable { kind: "top_coins", symbol: String::new() })
    }

    pub async fn ohlcv(&self, symbol: &str, timeframe: Timeframe, depth: u32) -> Result<OhlcvSeries, Unavailable> {
        let symbol = canonical_symbol(symbol);
        for client in &self.ohlcv_clients {
            let outcome = with_retry(&self.cooldowns, client.id(), Duration::from_secs(8), || {
                client.ohlcv(symbol, timeframe, depth)
            })
            .await;
            if let Some(ProviderOutcome::Ok(series)) = outcome {
                return Ok(series);
            }
        }
        Err(Unavailable { kind: "ohlcv", symbol: symbol.to_string() })
    }

    pub async fn derivs(&self, symbol: &str) -> Result<Derivatives, Unavailable> {
        let symbol = canonical_symbol(symbol);
        for client in &self.derivs_clients {
            let outcome = with_retry(&self.cooldowns, client.id(), Duration::from_secs(5), || client.derivs(symbol)).await;
            if let Some(ProviderOutcome::Ok(d)) = outcome {
                return Ok(d);
            }
        }
        Err(Unavailable { kind: "derivs", symbol: symbol.to_string() })
    }

    pub async fn options(&self, symbol: &str) -> Result<Options, Unavailable> {
        let symbol = canonical_symbol(symbol);
        for client in &self.options_clients {
            let outcome = with_retry(&self.cooldowns, client.id(), Duration::from_secs(5), || client.options(symbol)).await;
            if let Some(ProviderOutcome::Ok(o)) = outcome {
                return Ok(o);
            }
        }
        Err(Unavailable { kind: "options", symbol: symbol.to_string() })
    }

    pub async fn onchain(&self, symbol: &str) -> Result<OnChain, Unavailable> {
        let symbol = canonical_symbol(symbol);
        for client in &self.onchain_clients {
            let outcome = with_retry(&self.cooldowns, client.id(), Duration::from_secs(5), || client.onchain(symbol)).await;
            if let Some(ProviderOutcome::Ok(o)) = outcome {
                return Ok(o);
            }
        }
        Err(Unavailable { kind: "onchain", symbol: symbol.to_string() })
    }

    pub async fn sentiment(&self, symbol: &str) -> Result<Sentiment, Unavailable> {
        let symbol = canonical_symbol(symbol);
        for client in &self.sentiment_clients {
            let outcome = with_retry(&self.cooldowns, client.id(), Duration::from_secs(6), || client.sentiment(symbol)).await;
            if let Some(ProviderOutcome::Ok(s)) = outcome {
                return Ok(s);
            }
        }
        Err(Unavailable { kind: "sentiment", symbol: symbol.to_string() })
    }

    pub async fn analyze(&self, prompt: &str) -> Result<LlmRefinement, Unavailable> {
        for client in &self.llm_clients {
            let outcome = with_retry(&self.cooldowns, client.id(), Duration::from_secs(15), || client.analyze(prompt)).await;
            if let Some(ProviderOutcome::Ok(r)) = outcome {
                return Ok(r);
            }
        }
        Err(Unavailable { kind: "llm", symbol: String::new() })
    }

    /// Calls up to `n` distinct configured LLM clients directly (no
    /// fallback-on-failure semantics) so the aggregation engine can compare
    /// independent refinements for disagreement (spec §4.5 step 8). Clients
    /// that fail are simply omitted from the result.
    pub async fn analyze_independent(&self, prompt: &str, n: usize) -> Vec<LlmRefinement> {
        let mut results = Vec::new();
        for client in self.llm_clients.iter().take(n) {
            let outcome = with_retry(&self.cooldowns, client.id(), Duration::from_secs(15), || client.analyze(prompt)).await;
            if let Some(ProviderOutcome::Ok(r)) = outcome {
                results.push(r);
            }
        }
        results
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct AlwaysFails;
    #[async_trait]
    impl OhlcvClient for AlwaysFails {
        fn id(&self) -> &str {
            "always_fails"
        }
        async fn top_coins(&self, _: u32, _: FilterScope, _: Option<f64>, _: Option<f64>) -> ProviderOutcome<Vec<Coin>> {
            ProviderOutcome::PermanentError { reason: "nope".to_string() }
        }
        async fn ohlcv(&self, _: &str, _: Timeframe, _: u32) -> ProviderOutcome<OhlcvSeries> {
            ProviderOutcome::PermanentError { reason: "nope".to_string() }
        }
    }

    struct CountingFallback {
        calls: AtomicU32,
    }
    #[async_trait]
    impl OhlcvClient for CountingFallback {
        fn id(&self) -> &str {
            "fallback"
        }
        async fn top_coins(&self, _: u32, _: FilterScope, _: Option<f64>, _: Option<f64>) -> ProviderOutcome<Vec<Coin>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ProviderOutcome::Ok(vec![])
        }
        async fn ohlcv(&self, _: &str, _: Timeframe, _: u32) -> ProviderOutcome<OhlcvSeries> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ProviderOutcome::Ok(OhlcvSeries { symbol: "BTC".to_string(), timeframe: Timeframe::OneDay, candles: vec![] })
        }
    }

    #[tokio::test]
    async fn falls_through_to_next_client_on_permanent_error() {
        let fallback = Arc::new(CountingFallback { calls: AtomicU32::new(0) });
        let router = Router::new().with_ohlcv(Arc::new(AlwaysFails)).with_ohlcv(fallback.clone());
        let result = router.top_coins(10, FilterScope::All, None, None).await;
        assert!(result.is_ok());
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reports_unavailable_when_every_client_fails() {
        let router = Router::new().with_ohlcv(Arc::new(AlwaysFails));
        let result = router.top_coins(10, FilterScope::All, None, None).await;
        assert!(result.is_err());
    }
}
