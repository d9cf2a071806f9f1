// =============================================================================
// Adaptive Weighting (C8)
// =============================================================================
//
// Two independent cadences share this module: a 6-hourly metrics rollup that
// recomputes `BotAccuracyMetrics` from finalized `BotPrediction` rows, and a
// once-daily weight-adjustment pass applying the exact accuracy-bracket rules
// from §4.8. Probation lifecycle (disable, re-enable into probation, permanent
// disable after repeated offenses) piggybacks on the daily pass. Grounded on
// the teacher's `signals::weighted_score::RegimeWeights` per-`(bot, regime)`
// keyed weight table, generalized here to read its inputs from persisted
// outcomes instead of a fixed config.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::{info, warn};

use crate::store::Store;
use crate::types::{BotAccuracyMetrics, BotGuardrails, BotPrediction, BotProbationStatus, OutcomeStatus, RegimeLabel, WeightHistoryEntry};

const ROLLING_7D: ChronoDuration = ChronoDuration::days(7);
const ROLLING_30D: ChronoDuration = ChronoDuration::days(30);

const HIGH_ACCURACY: f64 = 0.70;
const HIGH_ACCURACY_MULTIPLIER: f64 = 1.30;
const WEIGHT_CEILING: f64 = 2.0;
const GOOD_ACCURACY: f64 = 0.60;
const GOOD_ACCURACY_MULTIPLIER: f64 = 1.10;
const NEUTRAL_ACCURACY: f64 = 0.50;
const POOR_ACCURACY_MULTIPLIER: f64 = 0.50;
const WEIGHT_FLOOR: f64 = 0.2;
const DISABLE_ACCURACY: f64 = 0.35;
const DISABLE_MIN_PREDICTIONS: u32 = 50;

const REENABLE_AFTER: ChronoDuration = ChronoDuration::days(7);
const PROBATION_MIN_PREDICTIONS: u32 = 20;
const PROBATION_PASS_ACCURACY: f64 = 0.50;
const PERMANENT_DISABLE_AFTER: u32 = 3;

pub struct AdaptiveWeighting {
    store: Arc<dyn Store>,
}

impl AdaptiveWeighting {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// 6-hourly pass: recompute every `(bot, regime)` pair's rolling accuracy
    /// windows from finalized predictions. Does not touch `current_weight` or
    /// `is_enabled` — that only happens in `run_daily_adjustment`.
    pub async fn run_rollup(&self) -> anyhow::Result<()> {
        let finalized = self.finalized_predictions().await?;
        let now = Utc::now();
        let mut by_bot_regime: HashMap<(String, RegimeLabel), Vec<&BotPrediction>> = HashMap::new();
        for prediction in &finalized {
            by_bot_regime.entry((prediction.bot_name.clone(), prediction.market_regime)).or_default().push(prediction);
        }

        for ((bot_name, regime), predictions) in by_bot_regime {
            let mut metrics = self
                .store
                .read_bot_accuracy_snapshot(&bot_name, regime)
                .await?
                .unwrap_or_else(|| BotAccuracyMetrics::new(bot_name.clone(), regime));

            metrics.total_predictions = predictions.len() as u32;
            metrics.correct_predictions = predictions.iter().filter(|p| p.outcome_status == OutcomeStatus::Success).count() as u32;
            metrics.accuracy_rate = rate(metrics.correct_predictions, metrics.total_predictions);
            metrics.win_rate = metrics.accuracy_rate;
            metrics.avg_profit_loss = average_profit_loss(&predictions);
            metrics.last_7d_accuracy = windowed_accuracy(&predictions, now, ROLLING_7D);
            metrics.last_30d_accuracy = windowed_accuracy(&predictions, now, ROLLING_30D);

            self.store.upsert_bot_accuracy(metrics).await?;
        }

        Ok(())
    }

    /// Daily pass: apply the accuracy-bracket weight-adjustment rules and
    /// drive the disable/re-enable/probation/permanent-disable lifecycle.
    pub async fn run_daily_adjustment(&self) -> anyhow::Result<()> {
        let now = Utc::now();
        let all_metrics = self.store.all_bot_accuracy().await?;

        for mut metrics in all_metrics {
            let from = metrics.current_weight;
            let (to, reason) = adjust_weight(from, metrics.accuracy_rate);
            if (to - from).abs() > f64::EPSILON {
                metrics.current_weight = to;
                metrics.weight_history.push(WeightHistoryEntry { at: now, from, to, reason: reason.clone() });
                info!(bot = metrics.bot_name, regime = %metrics.market_regime, from, to, reason, "bot weight adjusted");
            }

            if metrics.accuracy_rate < DISABLE_ACCURACY && metrics.total_predictions >= DISABLE_MIN_PREDICTIONS && metrics.is_enabled {
                metrics.is_enabled = false;
                metrics.auto_disabled_at = Some(now);
                metrics.auto_disabled_reason = Some(format!("accuracy {:.2} below {:.2} threshold over {} predictions", metrics.accuracy_rate, DISABLE_ACCURACY, metrics.total_predictions));
                warn!(bot = metrics.bot_name, accuracy = metrics.accuracy_rate, "bot auto-disabled");

                let mut probation = self
                    .store
                    .read_probation_status(&metrics.bot_name)
                    .await?
                    .unwrap_or_else(|| BotProbationStatus::new(metrics.bot_name.clone()));
                probation.times_disabled += 1;
                if probation.times_disabled >= PERMANENT_DISABLE_AFTER {
                    probation.permanently_disabled = true;
                    warn!(bot = metrics.bot_name, times_disabled = probation.times_disabled, "bot permanently disabled");
                }
                self.store.upsert_probation_status(probation).await?;
            }

            self.store.upsert_bot_accuracy(metrics).await?;
        }

        self.process_reenable_and_probation(now).await?;
        Ok(())
    }

    async fn process_reenable_and_probation(&self, now: DateTime<Utc>) -> anyhow::Result<()> {
        // Pass 1: disabled bots past their 7-day re-enable window come back
        // on probation with tightened guardrails.
        for mut metrics in self.store.all_bot_accuracy().await? {
            if metrics.is_enabled {
                continue;
            }
            let Some(disabled_at) = metrics.auto_disabled_at else { continue };
            if now - disabled_at < REENABLE_AFTER {
                continue;
            }

            let Some(mut probation) = self.store.read_probation_status(&metrics.bot_name).await? else { continue };
            if probation.permanently_disabled {
                continue;
            }

            metrics.is_enabled = true;
            metrics.auto_disabled_at = None;
            metrics.auto_disabled_reason = None;
            self.store.upsert_bot_accuracy(metrics.clone()).await?;

            probation.is_on_probation = true;
            probation.probation_start = Some(now);
            probation.probation_end = None;
            probation.probation_predictions_count = 0;
            probation.probation_correct_count = 0;
            probation.times_reenabled += 1;
            probation.guardrails = BotGuardrails::probation();
            self.store.upsert_probation_status(probation).await?;
            info!(bot = metrics.bot_name, "bot re-enabled into probation");
        }

        // Pass 2: bots that have accumulated enough probation predictions
        // either graduate with default guardrails or go back on the clock.
        for mut probation in self.store.all_probation_status().await? {
            if !probation.is_on_probation || probation.probation_predictions_count < PROBATION_MIN_PREDICTIONS {
                continue;
            }

            let probation_accuracy = rate(probation.probation_correct_count, probation.probation_predictions_count);
            if probation_accuracy >= PROBATION_PASS_ACCURACY {
                probation.is_on_probation = false;
                probation.probation_end = Some(now);
                probation.guardrails = BotGuardrails::default();
                info!(bot = probation.bot_name, probation_accuracy, "bot exits probation with default guardrails");
                self.store.upsert_probation_status(probation).await?;
                continue;
            }

            probation.is_on_probation = false;
            probation.times_disabled += 1;
            if probation.times_disabled >= PERMANENT_DISABLE_AFTER {
                probation.permanently_disabled = true;
                warn!(bot = probation.bot_name, "bot permanently disabled after repeated probation failures");
            }
            let bot_name = probation.bot_name.clone();
            self.store.upsert_probation_status(probation).await?;

            for mut metrics in self.store.all_bot_accuracy().await?.into_iter().filter(|m| m.bot_name == bot_name) {
                metrics.is_enabled = false;
                metrics.auto_disabled_at = Some(now);
                metrics.auto_disabled_reason = Some(format!("failed probation at {probation_accuracy:.2} accuracy"));
                self.store.upsert_bot_accuracy(metrics).await?;
            }
        }

        Ok(())
    }

    async fn finalized_predictions(&self) -> anyhow::Result<Vec<BotPrediction>> {
        Ok(self.store.finalized_predictions().await?)
    }
}

fn rate(correct: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    }
}

fn average_profit_loss(predictions: &[&BotPrediction]) -> f64 {
    let values: Vec<f64> = predictions.iter().filter_map(|p| p.profit_loss_percent).collect();
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn windowed_accuracy(predictions: &[&BotPrediction], now: DateTime<Utc>, window: ChronoDuration) -> f64 {
    let in_window: Vec<&&BotPrediction> = predictions.iter().filter(|p| now - p.timestamp <= window).collect();
    let total = in_window.len() as u32;
    let correct = in_window.iter().filter(|p| p.outcome_status == OutcomeStatus::Success).count() as u32;
    rate(correct, total)
}

/// The exact accuracy-bracket multiplier table (§4.8), applied to the
/// current weight and clamped to `[WEIGHT_FLOOR, WEIGHT_CEILING]`.
fn adjust_weight(current: f64, accuracy: f64) -> (f64, String) {
    if accuracy >= HIGH_ACCURACY {
        ((current * HIGH_ACCURACY_MULTIPLIER).min(WEIGHT_CEILING), format!("accuracy {accuracy:.2} >= {HIGH_ACCURACY:.2}"))
    } else if accuracy >= GOOD_ACCURACY {
        ((current * GOOD_ACCURACY_MULTIPLIER).min(WEIGHT_CEILING), format!("accuracy {accuracy:.2} >= {GOOD_ACCURACY:.2}"))
    } else if accuracy >= NEUTRAL_ACCURACY {
        (current, format!("accuracy {accuracy:.2} in neutral band"))
    } else {
        ((current * POOR_ACCURACY_MULTIPLIER).max(WEIGHT_FLOOR), format!("accuracy {accuracy:.2} < {NEUTRAL_ACCURACY:.2}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_accuracy_boosts_weight_capped_at_ceiling() {
        let (weight, _) = adjust_weight(1.8, 0.80);
        assert_eq!(weight, WEIGHT_CEILING);
    }

    #[test]
    fn good_accuracy_applies_modest_boost() {
        let (weight, _) = adjust_weight(1.0, 0.65);
        assert!((weight - 1.10).abs() < 1e-9);
    }

    #[test]
    fn neutral_band_leaves_weight_unchanged() {
        let (weight, _) = adjust_weight(1.0, 0.55);
        assert_eq!(weight, 1.0);
    }

    #[test]
    fn poor_accuracy_halves_weight_floored() {
        let (weight, _) = adjust_weight(0.3, 0.10);
        assert_eq!(weight, WEIGHT_FLOOR);
    }

    #[test]
    fn rate_handles_zero_total() {
        assert_eq!(rate(0, 0), 0.0);
    }
}
