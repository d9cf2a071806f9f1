// =============================================================================
// Scan Orchestrator (C6)
// =============================================================================
//
// `start_scan` creates the `ScanRun` row and spawns a detached worker task
// bound to its id, returning immediately — the same "spawn and hand back a
// handle" shape the teacher uses for its per-concern background loops in
// `main.rs`. Coin processing fans out over a `tokio::sync::Semaphore`-bounded
// pool; within a coin, feature -> bots -> aggregation -> persistence runs
// strictly in order (§5), with no ordering guarantee across coins.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::aggregation::{aggregate, AggregationInput};
use crate::bots::{apply_guardrails, BotContext, BotRegistry};
use crate::config::RuntimeConfig;
use crate::indicators::feature_vector::build_feature_vector;
use crate::regime::detect_regime;
use crate::router::Router;
use crate::store::{RecommendationBatch, Store};
use crate::types::{
    new_id, round_confidence, BotPrediction, Coin, Id, OutcomeStatus, Recommendation, RegimeLabel,
    ScanRun, ScanRunStatus, ScanSpec, Timeframe,
};

/// How close to the scan deadline the orchestrator stops dispatching new
/// coin tasks (§4.6 step 6).
const DEADLINE_STOP_MARGIN: Duration = Duration::from_secs(20);
/// Grace period for in-flight coin tasks after the deadline is reached.
const CANCELLATION_GRACE: Duration = Duration::from_secs(5);
/// How often (in completed coins) batched counters are refreshed (§4.6 step 5).
const COUNTER_FLUSH_INTERVAL: u32 = 10;

const ALIGNMENT_DEPTHS: [(Timeframe, u32); 4] = [
    (Timeframe::OneHour, 180),
    (Timeframe::FourHour, 168),
    (Timeframe::OneDay, 180),
    (Timeframe::OneWeek, 104),
];

pub struct ScanOrchestrator {
    store: Arc<dyn Store>,
    router: Arc<Router>,
    bots: Arc<BotRegistry>,
    config: Arc<RwLock<RuntimeConfig>>,
}

impl ScanOrchestrator {
    pub fn new(store: Arc<dyn Store>, router: Arc<Router>, bots: Arc<BotRegistry>, config: Arc<RwLock<RuntimeConfig>>) -> Arc<Self> {
        Arc::new(Self { store, router, bots, config })
    }

    /// Enqueues a run and returns immediately with `status=running`. The
    /// actual work happens in a detached task.
    pub async fn start_scan(self: &Arc<Self>, spec: ScanSpec) -> Id {
        let run = ScanRun::new(&spec);
        let run_id = run.id;
        if let Err(e) = self.store.create_scan_run(run).await {
            error!(error = %e, "failed to create scan run");
        }

        let this = self.clone();
        tokio::spawn(async move {
            this.run(run_id, spec).await;
        });

        run_id
    }

    pub async fn scan_status(&self, run_id: Id) -> Result<ScanRun, crate::store::StoreError> {
        self.store.get_scan_run(run_id).await
    }

    async fn run(self: Arc<Self>, run_id: Id, spec: ScanSpec) {
        let profile = {
            let config = self.config.read();
            config.scan_profiles.get(&spec.scan_type).cloned()
        };
        let Some(profile) = profile else {
            self.fail_run(run_id, format!("unknown scan_type {}", spec.scan_type)).await;
            return;
        };

        let coins = match self.router.top_coins(spec.coin_limit, spec.filter_scope, spec.min_price, spec.max_price).await {
            Ok(coins) => coins,
            Err(unavailable) => {
                self.fail_run(run_id, format!("universe unavailable: {}", unavailable.kind)).await;
                return;
            }
        };

        let stablecoins_filtered: Vec<Coin> = {
            let config = self.config.read();
            coins.into_iter().filter(|c| !config.is_stablecoin(&c.symbol)).collect()
        };

        let bot_weights = self.load_bot_weights().await;
        let accuracy = self.load_accuracy_map().await;
        let probation = self.load_probation_map().await;

        let deadline = tokio::time::Instant::now() + Duration::from_secs(profile.deadline_budget_secs);
        let semaphore = Arc::new(Semaphore::new(profile.concurrency));
        let mut join_set: JoinSet<Option<Recommendation>> = JoinSet::new();

        let mut dispatched = 0u32;
        let mut skipped_at_deadline = 0u32;

        for coin in stablecoins_filtered {
            if tokio::time::Instant::now() + DEADLINE_STOP_MARGIN >= deadline {
                skipped_at_deadline += 1;
                continue;
            }

            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            let this = self.clone();
            let bot_weights = bot_weights.clone();
            let accuracy = accuracy.clone();
            let probation = probation.clone();
            let coin_deadline = self.config.read().coin_task_deadline_secs;
            let use_llm = profile.use_llm;
            let confidence_threshold = spec.confidence_threshold;

            join_set.spawn(async move {
                let _permit = permit;
                match tokio::time::timeout(
                    Duration::from_secs(coin_deadline),
                    this.process_coin(run_id, coin.clone(), &bot_weights, &accuracy, &probation, use_llm, confidence_threshold),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(symbol = %coin.symbol, "coin task exceeded its deadline, discarding partial work");
                        None
                    }
                }
            });

            dispatched += 1;
            if dispatched % COUNTER_FLUSH_INTERVAL == 0 {
                self.refresh_counters(run_id).await;
            }
        }

        if skipped_at_deadline > 0 {
            info!(run_id = %run_id, skipped_at_deadline, "stopped dispatching new coins near scan deadline");
        }

        let mut processed = 0u32;
        let mut signals = 0u32;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now()) + CANCELLATION_GRACE;
            tokio::select! {
                next = join_set.join_next() => {
                    match next {
                        Some(Ok(Some(_))) => { processed += 1; signals += 1; }
                        Some(Ok(None)) => { processed += 1; }
                        Some(Err(e)) => { warn!(error = %e, "coin task panicked"); processed += 1; }
                        None => break,
                    }
                }
                _ = tokio::time::sleep(remaining) => {
                    warn!(run_id = %run_id, "cancellation grace period elapsed, abandoning remaining coin tasks");
                    join_set.abort_all();
                    break;
                }
            }
        }

        self.finalize_run(run_id, processed, signals).await;
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_coin(
        &self,
        run_id: Id,
        coin: Coin,
        bot_weights: &HashMap<String, f64>,
        accuracy: &HashMap<(String, RegimeLabel), crate::types::BotAccuracyMetrics>,
        probation: &HashMap<String, crate::types::BotProbationStatus>,
        use_llm: bool,
        confidence_threshold: f64,
    ) -> Option<Recommendation> {
        let mut timeframe_regimes = HashMap::new();
        let mut daily_series = None;

        for (timeframe, depth) in ALIGNMENT_DEPTHS {
            if let Ok(series) = self.router.ohlcv(&coin.symbol, timeframe, depth).await {
                if let Some(regime) = detect_regime(&series.candles) {
                    timeframe_regimes.insert(timeframe, regime.label);
                }
                if timeframe == Timeframe::OneDay {
                    daily_series = Some(series);
                }
            }
        }

        let daily_series = daily_series?;
        if daily_series.candles.len() < 180 {
            return None;
        }
        let regime = detect_regime(&daily_series.candles)?;
        let features = build_feature_vector(&daily_series, regime);

        let onchain_allowed = self.config.read().onchain_allowed(&coin.symbol);
        let (derivs, onchain, sentiment) = tokio::join!(
            self.router.derivs(&coin.symbol),
            async {
                if onchain_allowed {
                    self.router.onchain(&coin.symbol).await
                } else {
                    Err(crate::router::Unavailable { kind: "onchain", symbol: coin.symbol.clone() })
                }
            },
            self.router.sentiment(&coin.symbol),
        );
        let derivs = derivs.ok();
        let onchain = onchain.ok();
        let sentiment = sentiment.ok();

        let ctx = BotContext {
            features: &features,
            derivatives: derivs.as_ref(),
            options: None,
            onchain: onchain.as_ref(),
            sentiment: sentiment.as_ref(),
            llm: None,
        };

        let enabled = self.bots.enabled_bots(regime.label, accuracy, probation);
        let default_guardrails = crate::types::BotGuardrails::default();
        let votes: Vec<_> = enabled
            .iter()
            .filter_map(|bot| bot.analyze(&ctx))
            .filter_map(|vote| {
                let guardrails = probation.get(&vote.bot_name).map(|p| &p.guardrails).unwrap_or(&default_guardrails);
                apply_guardrails(vote, guardrails)
            })
            .collect();
        if votes.is_empty() {
            return None;
        }

        let predictions: Vec<BotPrediction> = votes
            .iter()
            .map(|vote| BotPrediction {
                id: new_id(),
                run_id,
                bot_name: vote.bot_name.clone(),
                coin_symbol: coin.symbol.clone(),
                coin_name: coin.name.clone(),
                entry_price: vote.entry,
                target_price: vote.take_profit,
                stop_loss: vote.stop_loss,
                position_direction: vote.direction,
                confidence_score: round_confidence(vote.confidence as f64),
                leverage: vote.leverage,
                timestamp: Utc::now(),
                market_regime: regime.label,
                outcome_status: OutcomeStatus::Pending,
                outcome_checked_at: None,
                outcome_price: None,
                profit_loss_percent: None,
            })
            .collect();

        let input = AggregationInput {
            run_id,
            coin: &coin.name,
            ticker: &coin.symbol,
            current_price: coin.current_price,
            votes,
            regime,
            timeframe_regimes,
            sentiment: sentiment.as_ref(),
            onchain: onchain.as_ref(),
            bot_weights,
            use_llm,
            confidence_threshold,
        };

        let recommendation = aggregate(input, Some(&self.router)).await?;

        if let Err(e) = self
            .store
            .insert_recommendation_batch(RecommendationBatch { recommendation: recommendation.clone(), predictions })
            .await
        {
            error!(symbol = %coin.symbol, error = %e, "failed to persist recommendation batch");
            return None;
        }

        Some(recommendation)
    }

    async fn load_bot_weights(&self) -> HashMap<String, f64> {
        self.store
            .all_bot_accuracy()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|m| (m.bot_name, m.current_weight))
            .collect()
    }

    async fn load_accuracy_map(&self) -> HashMap<(String, RegimeLabel), crate::types::BotAccuracyMetrics> {
        self.store
            .all_bot_accuracy()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|m| ((m.bot_name.clone(), m.market_regime), m))
            .collect()
    }

    async fn load_probation_map(&self) -> HashMap<String, crate::types::BotProbationStatus> {
        self.store
            .all_probation_status()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|p| (p.bot_name.clone(), p))
            .collect()
    }

    async fn refresh_counters(&self, run_id: Id) {
        if let Ok(mut run) = self.store.get_scan_run(run_id).await {
            run.total_coins += COUNTER_FLUSH_INTERVAL;
            let _ = self.store.update_scan_run(run).await;
        }
    }

    async fn finalize_run(&self, run_id: Id, total_coins: u32, total_signals: u32) {
        if let Ok(mut run) = self.store.get_scan_run(run_id).await {
            run.status = ScanRunStatus::Completed;
            run.completed_at = Some(Utc::now());
            run.total_coins = total_coins;
            run.total_signals = total_signals;
            let _ = self.store.update_scan_run(run).await;
        }
    }

    async fn fail_run(&self, run_id: Id, error: String) {
        if let Ok(mut run) = self.store.get_scan_run(run_id).await {
            run.status = ScanRunStatus::Failed;
            run.completed_at = Some(Utc::now());
            run.error = Some(error);
            let _ = self.store.update_scan_run(run).await;
        }
    }
}
