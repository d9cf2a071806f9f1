// =============================================================================
// Central application state
// =============================================================================
//
// Ties together the store, provider router, bot registry, runtime config,
// and the three long-running engines (scan orchestrator, outcome tracker,
// adaptive weighting) behind one `Arc<AppState>` the HTTP surface and the
// scheduler both hold. Grounded on the teacher's own `AppState`: shared
// subsystem handles behind `Arc`, hot-reloadable config behind
// `parking_lot::RwLock`.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::bots::BotRegistry;
use crate::config::RuntimeConfig;
use crate::orchestrator::ScanOrchestrator;
use crate::outcome::OutcomeTracker;
use crate::providers::binance_ohlcv::BinanceOhlcvClient;
use crate::providers::generic_rest::{RestDerivativesClient, RestLlmClient, RestOnChainClient, RestOptionsClient, RestSentimentClient};
use crate::router::Router;
use crate::store::in_memory::InMemoryStore;
use crate::store::Store;
use crate::weighting::AdaptiveWeighting;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub router: Arc<Router>,
    pub bots: Arc<BotRegistry>,
    pub config: Arc<RwLock<RuntimeConfig>>,
    pub orchestrator: Arc<ScanOrchestrator>,
    pub outcome_tracker: Arc<OutcomeTracker>,
    pub weighting: Arc<AdaptiveWeighting>,
}

impl AppState {
    pub fn new(config: RuntimeConfig, credentials: &crate::config::ProviderCredentials) -> Self {
        let config = Arc::new(RwLock::new(config));
        let order = config.read().provider_order.clone();

        let mut router = Router::new();
        for id in order.get("ohlcv").cloned().unwrap_or_default() {
            if id == "binance" {
                router = router.with_ohlcv(Arc::new(BinanceOhlcvClient::new()));
            }
        }
        for id in order.get("derivatives").cloned().unwrap_or_default() {
            router = router.with_derivs(Arc::new(RestDerivativesClient::new(id.clone(), format!("https://{id}.example/derivs/{{symbol}}"))));
        }
        for id in order.get("options").cloned().unwrap_or_default() {
            router = router.with_options(Arc::new(RestOptionsClient::new(id.clone(), format!("https://{id}.example/options/{{symbol}}"))));
        }
        for id in order.get("onchain").cloned().unwrap_or_default() {
            router = router.with_onchain(Arc::new(RestOnChainClient::new(id.clone(), format!("https://{id}.example/onchain/{{symbol}}"))));
        }
        for id in order.get("sentiment").cloned().unwrap_or_default() {
            router = router.with_sentiment(Arc::new(RestSentimentClient::new(id.clone(), format!("https://{id}.example/sentiment/{{symbol}}"))));
        }
        if let Some(api_key) = credentials.llm_api_key.clone() {
            for id in order.get("llm").cloned().unwrap_or_default() {
                router = router.with_llm(Arc::new(RestLlmClient::new(id.clone(), format!("https://{id}.example/v1/complete"), api_key.clone())));
            }
        }
        let router = Arc::new(router);

        let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
        let bots = Arc::new(BotRegistry::new());

        let orchestrator = ScanOrchestrator::new(store.clone(), router.clone(), bots.clone(), config.clone());
        let outcome_tracker = Arc::new(OutcomeTracker::new(store.clone(), router.clone()));
        let weighting = Arc::new(AdaptiveWeighting::new(store.clone()));

        Self { store, router, bots, config, orchestrator, outcome_tracker, weighting }
    }
}
