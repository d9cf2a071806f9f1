// =============================================================================
// Outcome Tracker (C7)
// =============================================================================
//
// Runs independently of any scan, on its own cadence (§4.7): sample prices
// for every open prediction, detect TP/SL first-wins, and finalize anything
// that has aged past its 24h/48h/7d checkpoint without being hit. Grounded
// on `binance/rate_limit.rs`'s periodic-polling idiom for the sampling loop
// shape and on the teacher's "first event wins, then stop checking" style
// used by `exit/triple_barrier.rs` for its own TP/SL race.
//
// `BotPrediction` carries a single `outcome_status`/`outcome_price` pair, not
// one per horizon, so only the first horizon a prediction reaches actually
// finalizes it: once `outcome_status` leaves `Pending`, `pending_predictions`
// no longer returns the row and later horizons never re-evaluate it. This is
// an explicit Open Question resolution, not an oversight — see DESIGN.md.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::{info, warn};

use crate::router::Router;
use crate::store::Store;
use crate::types::{
    BotPrediction, Direction, OutcomeStatus, PricePoint, TpslEvent, TpslEventType, Timeframe,
};

/// First horizon a prediction is evaluated against if no TP/SL has fired.
/// `BotPrediction` only carries one outcome slot, so whichever horizon a
/// still-pending prediction is checked at first is the one that finalizes
/// it (documented as an Open Question resolution in DESIGN.md).
const HORIZON_24H: ChronoDuration = ChronoDuration::hours(24);
/// Fraction of the distance to target that counts as "moved toward it" for
/// a `partial` horizon outcome (§4.7).
const PARTIAL_PROGRESS_THRESHOLD: f64 = 0.5;

pub struct OutcomeTracker {
    store: Arc<dyn Store>,
    router: Arc<Router>,
}

impl OutcomeTracker {
    pub fn new(store: Arc<dyn Store>, router: Arc<Router>) -> Self {
        Self { store, router }
    }

    /// One pass of the 15-minute loop: sample a price point per referenced
    /// coin, then check every open prediction for a TP/SL hit, then evaluate
    /// anything that has aged past its next unevaluated horizon.
    pub async fn run_once(&self) -> anyhow::Result<()> {
        let pending = self.store.pending_predictions().await?;
        if pending.is_empty() {
            return Ok(());
        }

        let mut symbols = HashSet::new();
        for prediction in &pending {
            symbols.insert(prediction.coin_symbol.clone());
        }

        let mut prices = std::collections::HashMap::new();
        for symbol in symbols {
            if let Some(price) = self.current_price(&symbol).await {
                self.store
                    .insert_price_point(PricePoint {
                        coin: symbol.clone(),
                        price,
                        volume_24h: None,
                        market_cap: None,
                        recorded_at: Utc::now(),
                    })
                    .await?;
                prices.insert(symbol, price);
            }
        }

        let now = Utc::now();
        for prediction in pending {
            let Some(&price) = prices.get(&prediction.coin_symbol) else {
                continue;
            };

            if let Some(event) = detect_tpsl(&prediction, price, now) {
                self.finalize_tpsl(prediction, event).await?;
                continue;
            }

            if let Some(status) = evaluate_horizon(&prediction, price, now) {
                self.finalize_horizon(prediction, price, status).await?;
            }
        }

        Ok(())
    }

    async fn current_price(&self, symbol: &str) -> Option<f64> {
        let series = self.router.ohlcv(symbol, Timeframe::OneHour, 2).await.ok()?;
        series.candles.last().map(|c| c.c)
    }

    async fn finalize_tpsl(&self, mut prediction: BotPrediction, event: TpslEvent) -> anyhow::Result<()> {
        info!(
            bot = prediction.bot_name,
            coin = prediction.coin_symbol,
            event_type = %event.event_type,
            profit_loss_percent = event.profit_loss_percent,
            "tp/sl hit"
        );
        prediction.outcome_status = match event.event_type {
            TpslEventType::TakeProfit => OutcomeStatus::Success,
            TpslEventType::StopLoss => OutcomeStatus::Failed,
        };
        prediction.outcome_checked_at = Some(event.hit_at);
        prediction.outcome_price = Some(event.actual_hit_price);
        prediction.profit_loss_percent = Some(event.profit_loss_percent);
        self.store.insert_tpsl_event(event).await?;
        let bot_name = prediction.bot_name.clone();
        let status = prediction.outcome_status;
        self.store.update_prediction_outcome(prediction).await?;
        self.record_probation_outcome(&bot_name, status).await?;
        Ok(())
    }

    async fn finalize_horizon(&self, mut prediction: BotPrediction, price: f64, status: OutcomeStatus) -> anyhow::Result<()> {
        let sign = direction_sign(prediction.position_direction);
        let profit_loss_percent = sign * (price - prediction.entry_price) / prediction.entry_price * prediction.leverage as f64 * 100.0;
        warn!(
            bot = prediction.bot_name,
            coin = prediction.coin_symbol,
            outcome = %status,
            "prediction finalized at horizon without tp/sl"
        );
        prediction.outcome_status = status;
        prediction.outcome_checked_at = Some(Utc::now());
        prediction.outcome_price = Some(price);
        prediction.profit_loss_percent = Some(profit_loss_percent);
        let bot_name = prediction.bot_name.clone();
        self.store.update_prediction_outcome(prediction).await?;
        self.record_probation_outcome(&bot_name, status).await?;
        Ok(())
    }

    /// Keeps `BotProbationStatus.probation_predictions_count`/
    /// `probation_correct_count` current for bots on probation (§4.8) —
    /// `AdaptiveWeighting`'s re-enable/graduate pass reads these, so every
    /// finalized prediction from a probationary bot must be tallied here.
    async fn record_probation_outcome(&self, bot_name: &str, status: OutcomeStatus) -> anyhow::Result<()> {
        let Some(mut probation) = self.store.read_probation_status(bot_name).await? else {
            return Ok(());
        };
        if !probation.is_on_probation {
            return Ok(());
        }
        probation.probation_predictions_count += 1;
        if status == OutcomeStatus::Success {
            probation.probation_correct_count += 1;
        }
        self.store.upsert_probation_status(probation).await?;
        Ok(())
    }
}

fn direction_sign(direction: Direction) -> f64 {
    match direction {
        Direction::Long => 1.0,
        Direction::Short => -1.0,
    }
}

fn detect_tpsl(prediction: &BotPrediction, price: f64, now: DateTime<Utc>) -> Option<TpslEvent> {
    let event_type = match prediction.position_direction {
        Direction::Long if price >= prediction.target_price => TpslEventType::TakeProfit,
        Direction::Long if price <= prediction.stop_loss => TpslEventType::StopLoss,
        Direction::Short if price <= prediction.target_price => TpslEventType::TakeProfit,
        Direction::Short if price >= prediction.stop_loss => TpslEventType::StopLoss,
        _ => return None,
    };

    let hours_to_hit = (now - prediction.timestamp).num_seconds() as f64 / 3600.0;
    let sign = direction_sign(prediction.position_direction);
    let profit_loss_percent = sign * (price - prediction.entry_price) / prediction.entry_price * prediction.leverage as f64 * 100.0;

    Some(TpslEvent {
        prediction_id: prediction.id,
        event_type,
        entry_price: prediction.entry_price,
        target_price: prediction.target_price,
        actual_hit_price: price,
        hit_at: now,
        hours_to_hit,
        profit_loss_percent,
    })
}

/// Returns the outcome the prediction should be finalized with once it has
/// aged past the first horizon (24h, 48h, or 7d — whichever the caller is
/// checking first wins, since a single `BotPrediction` only ever leaves
/// `Pending` once). `detect_tpsl` already runs first and short-circuits a
/// touched target, so every case reaching this function is by definition
/// "without touching it" — a prediction on the correct side of entry that
/// covered at least half the distance to target is `partial`; anything
/// short of that (including the wrong direction outright) is `failed`.
fn evaluate_horizon(prediction: &BotPrediction, price: f64, now: DateTime<Utc>) -> Option<OutcomeStatus> {
    let age = now - prediction.timestamp;
    if age < HORIZON_24H {
        return None;
    }

    let correct = match prediction.position_direction {
        Direction::Long => price > prediction.entry_price,
        Direction::Short => price < prediction.entry_price,
    };
    if !correct {
        return Some(OutcomeStatus::Failed);
    }

    let target_distance = (prediction.target_price - prediction.entry_price).abs();
    if target_distance <= 0.0 {
        return Some(OutcomeStatus::Failed);
    }
    let progress = (price - prediction.entry_price).abs() / target_distance;
    if progress >= PARTIAL_PROGRESS_THRESHOLD {
        Some(OutcomeStatus::Partial)
    } else {
        Some(OutcomeStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{new_id, RegimeLabel};

    fn base_prediction(direction: Direction, age_hours: i64) -> BotPrediction {
        BotPrediction {
            id: new_id(),
            run_id: new_id(),
            bot_name: "trend_rider".to_string(),
            coin_symbol: "BTC".to_string(),
            coin_name: "Bitcoin".to_string(),
            entry_price: 100.0,
            target_price: match direction {
                Direction::Long => 110.0,
                Direction::Short => 90.0,
            },
            stop_loss: match direction {
                Direction::Long => 95.0,
                Direction::Short => 105.0,
            },
            position_direction: direction,
            confidence_score: 8,
            leverage: 2,
            timestamp: Utc::now() - ChronoDuration::hours(age_hours),
            market_regime: RegimeLabel::Bull,
            outcome_status: OutcomeStatus::Pending,
            outcome_checked_at: None,
            outcome_price: None,
            profit_loss_percent: None,
        }
    }

    #[test]
    fn long_take_profit_fires_when_price_clears_target() {
        let prediction = base_prediction(Direction::Long, 1);
        let event = detect_tpsl(&prediction, 111.0, Utc::now()).unwrap();
        assert_eq!(event.event_type, TpslEventType::TakeProfit);
        assert!(event.profit_loss_percent > 0.0);
    }

    #[test]
    fn long_stop_loss_fires_when_price_drops_below_stop() {
        let prediction = base_prediction(Direction::Long, 1);
        let event = detect_tpsl(&prediction, 94.0, Utc::now()).unwrap();
        assert_eq!(event.event_type, TpslEventType::StopLoss);
        assert!(event.profit_loss_percent < 0.0);
    }

    #[test]
    fn short_take_profit_fires_when_price_drops_below_target() {
        let prediction = base_prediction(Direction::Short, 1);
        let event = detect_tpsl(&prediction, 89.0, Utc::now()).unwrap();
        assert_eq!(event.event_type, TpslEventType::TakeProfit);
    }

    #[test]
    fn no_event_inside_the_band() {
        let prediction = base_prediction(Direction::Long, 1);
        assert!(detect_tpsl(&prediction, 102.0, Utc::now()).is_none());
    }

    #[test]
    fn horizon_evaluation_is_none_before_24h() {
        let prediction = base_prediction(Direction::Long, 10);
        assert!(evaluate_horizon(&prediction, 101.0, Utc::now()).is_none());
    }

    #[test]
    fn horizon_evaluation_is_partial_when_past_halfway_without_touching_target() {
        let prediction = base_prediction(Direction::Long, 25);
        // entry 100, target 110: 109 is 90% of the way there, short of touching it.
        assert_eq!(evaluate_horizon(&prediction, 109.0, Utc::now()), Some(OutcomeStatus::Partial));
    }

    #[test]
    fn horizon_evaluation_fails_when_price_never_cleared_entry() {
        let prediction = base_prediction(Direction::Long, 24 * 8);
        assert_eq!(evaluate_horizon(&prediction, 99.0, Utc::now()), Some(OutcomeStatus::Failed));
    }

    #[test]
    fn horizon_evaluation_fails_when_short_of_halfway_to_target() {
        let prediction = base_prediction(Direction::Long, 25);
        // entry 100, target 110: 103 is 30% of the way there.
        assert_eq!(evaluate_horizon(&prediction, 103.0, Utc::now()), Some(OutcomeStatus::Failed));
    }
}
