// =============================================================================
// Aggregation Engine (C5)
// =============================================================================
//
// Turns one coin's bot votes into a single `Recommendation`, or drops the
// coin entirely if the filters reject it. The ten steps run in a fixed
// order; each one multiplies or gates the running confidence scalar rather
// than recomputing from scratch, mirroring the teacher's
// `signals::weighted_score::WeightedScorer` accumulate-then-decide shape.

pub mod alignment;
pub mod tally;
pub mod weights;

use std::collections::HashMap;

use tracing::{info, warn};

use crate::aggregation::alignment::{alignment_score_and_boost, dominant_regime};
use crate::aggregation::tally::{apply_regime_weighting, gate_confidence, weighted_tally};
use crate::router::Router;
use crate::types::{
    sanitize, new_id, BotVote, Direction, DirectionalSignal, Id, OnChain, Regime, RegimeLabel,
    Recommendation, RiskNote, Sentiment, Timeframe,
};

const EXTERNAL_NUDGE_CAP: f64 = 0.15;
const SENTIMENT_NUDGE: f64 = 0.10;
const ONCHAIN_NUDGE: f64 = 0.05;
const AI_REFINEMENT_THRESHOLD: f64 = 0.75;
const AI_REFINEMENT_MAX: f64 = 0.95;
const AI_AGREEMENT_WINDOW: f64 = 0.05;
const AI_DISAGREEMENT_WINDOW: f64 = 0.10;
const AI_AGREEMENT_BOOST: f64 = 1.08;
const CONTRARIAN_MIN_COUNT: usize = 3;
const CONTRARIAN_MIN_CONFIDENCE: u8 = 7;
const CONTRARIAN_BOOST: f64 = 1.15;

const PRICE_TARGET_24H: f64 = 0.02;
const PRICE_TARGET_48H: f64 = 0.04;
const PRICE_TARGET_7D: f64 = 0.08;

pub struct AggregationInput<'a> {
    pub run_id: Id,
    pub coin: &'a str,
    pub ticker: &'a str,
    pub current_price: f64,
    pub votes: Vec<BotVote>,
    pub regime: Regime,
    pub timeframe_regimes: HashMap<Timeframe, RegimeLabel>,
    pub sentiment: Option<&'a Sentiment>,
    pub onchain: Option<&'a OnChain>,
    pub bot_weights: &'a HashMap<String, f64>,
    pub use_llm: bool,
    pub confidence_threshold: f64,
}

fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

fn count_contrarian_same_direction(votes: &[BotVote], direction: Direction) -> usize {
    votes
        .iter()
        .filter(|v| {
            v.bot_category == crate::types::BotCategory::Contrarian
                && v.direction == direction
                && v.confidence >= CONTRARIAN_MIN_CONFIDENCE
        })
        .count()
}

fn sentiment_matches(sentiment: &Sentiment, direction: Direction) -> bool {
    matches!(
        (sentiment.classification, direction),
        (DirectionalSignal::Bullish, Direction::Long) | (DirectionalSignal::Bearish, Direction::Short)
    )
}

fn onchain_matches(onchain: &OnChain, direction: Direction) -> bool {
    matches!(
        (onchain.overall_signal, direction),
        (DirectionalSignal::Bullish, Direction::Long) | (DirectionalSignal::Bearish, Direction::Short)
    )
}

/// Runs the full ten-step pipeline for one coin. Returns `None` if gating
/// leaves no eligible votes, or if any computed number turns out
/// non-finite (sanitization failure rejects the whole recommendation since
/// `Recommendation`'s numeric fields are not optional).
pub async fn aggregate(input: AggregationInput<'_>, router: Option<&Router>) -> Option<Recommendation> {
    // Step 1: confidence gating.
    let gated = gate_confidence(input.votes.clone(), input.confidence_threshold);
    if gated.is_empty() {
        return None;
    }

    // Step 2: regime weighting.
    let effective = apply_regime_weighting(gated, input.regime.label);

    // Steps 3-4: weighted tally, tie-break, consensus tier.
    let (tally, consensus_multiplier, mut high_uncertainty) = weighted_tally(&effective, input.bot_weights)?;

    let winning_confidences: Vec<f64> = tally.winning_votes.iter().map(|v| v.effective_confidence).collect();
    let mean_effective = winning_confidences.iter().sum::<f64>() / winning_confidences.len() as f64;
    let mut confidence = (mean_effective / 10.0).clamp(0.0, 1.0);
    confidence *= consensus_multiplier;

    // Step 5: contrarian amplification, capped once.
    let contrarian_count = count_contrarian_same_direction(&input.votes, tally.direction);
    if contrarian_count >= CONTRARIAN_MIN_COUNT {
        confidence *= CONTRARIAN_BOOST;
    }

    // Step 6: multi-timeframe alignment.
    let (alignment_score, alignment_boost) = alignment_score_and_boost(&input.timeframe_regimes, tally.direction);
    confidence *= alignment_boost;

    // Step 7: external-signal nudges, capped at +15% total.
    let mut nudge = 0.0;
    if let Some(sentiment) = input.sentiment {
        if sentiment_matches(sentiment, tally.direction) {
            nudge += SENTIMENT_NUDGE;
        }
    }
    if let Some(onchain) = input.onchain {
        if onchain_matches(onchain, tally.direction) {
            nudge += ONCHAIN_NUDGE;
        }
    }
    nudge = nudge.min(EXTERNAL_NUDGE_CAP);
    confidence *= 1.0 + nudge;

    // Step 8: AI refinement, only once post-boost confidence clears the bar.
    let mut ai_reasoning = None;
    let mut action_plan = None;
    let mut risk_assessment = None;
    let mut market_context = None;

    if input.use_llm && confidence >= AI_REFINEMENT_THRESHOLD {
        if let Some(router) = router {
            let prompt = build_refinement_prompt(&input, tally.direction, confidence);
            let refinements = router.analyze_independent(&prompt, 2).await;
            match refinements.as_slice() {
                [] => {
                    warn!(coin = input.coin, "llm refinement unavailable, retaining pre-refinement confidence");
                }
                [single] => {
                    confidence = single.refined_confidence.clamp(0.0, AI_REFINEMENT_MAX);
                    ai_reasoning = Some(single.reasoning.clone());
                    action_plan = Some(single.action_plan.clone());
                    risk_assessment = Some(single.risk_assessment.clone());
                    market_context = Some(single.market_context.clone());
                }
                [first, second, ..] => {
                    let a = first.refined_confidence.clamp(0.0, AI_REFINEMENT_MAX);
                    let b = second.refined_confidence.clamp(0.0, AI_REFINEMENT_MAX);
                    let diff = (a - b).abs();
                    confidence = if diff > AI_DISAGREEMENT_WINDOW {
                        high_uncertainty = true;
                        a.min(b)
                    } else if diff <= AI_AGREEMENT_WINDOW {
                        (a.max(b) * AI_AGREEMENT_BOOST).min(AI_REFINEMENT_MAX)
                    } else {
                        (a + b) / 2.0
                    };
                    ai_reasoning = Some(first.reasoning.clone());
                    action_plan = Some(first.action_plan.clone());
                    risk_assessment = Some(first.risk_assessment.clone());
                    market_context = Some(first.market_context.clone());
                }
            }
        }
    }

    // Step 9: price targets from the median of winning-side votes.
    let avg_entry = median(tally.winning_votes.iter().map(|v| v.vote.entry).collect());
    let avg_take_profit = median(tally.winning_votes.iter().map(|v| v.vote.take_profit).collect());
    let avg_stop_loss = median(tally.winning_votes.iter().map(|v| v.vote.stop_loss).collect());

    let sign = match tally.direction {
        Direction::Long => 1.0,
        Direction::Short => -1.0,
    };
    let predicted_change_24h = PRICE_TARGET_24H * confidence * sign;
    let predicted_change_48h = PRICE_TARGET_48H * confidence * sign;
    let predicted_change_7d = PRICE_TARGET_7D * confidence * sign;
    let predicted_24h = input.current_price * (1.0 + predicted_change_24h);
    let predicted_48h = input.current_price * (1.0 + predicted_change_48h);
    let predicted_7d = input.current_price * (1.0 + predicted_change_7d);

    let long_bots = input.votes.iter().filter(|v| v.direction == Direction::Long).count() as u32;
    let short_bots = input.votes.iter().filter(|v| v.direction == Direction::Short).count() as u32;

    let risk_note = if high_uncertainty { RiskNote::HighUncertainty } else { RiskNote::None };
    let dominant_regime = dominant_regime(&input.timeframe_regimes, input.regime.label);

    let fields = [
        input.current_price,
        confidence,
        avg_entry,
        avg_take_profit,
        avg_stop_loss,
        predicted_24h,
        predicted_48h,
        predicted_7d,
        predicted_change_24h,
        predicted_change_48h,
        predicted_change_7d,
        input.regime.confidence,
    ];
    if fields.iter().any(|f| sanitize(*f).is_none()) {
        warn!(coin = input.coin, "recommendation rejected, non-finite value in computed fields");
        return None;
    }

    info!(
        coin = input.coin,
        direction = %tally.direction,
        confidence,
        alignment_score,
        "recommendation finalized"
    );

    Some(Recommendation {
        id: new_id(),
        run_id: input.run_id,
        coin: input.coin.to_string(),
        ticker: input.ticker.to_string(),
        current_price: input.current_price,
        consensus_direction: tally.direction,
        avg_confidence: confidence,
        bot_count: input.votes.len() as u32,
        long_bots,
        short_bots,
        avg_entry,
        avg_take_profit,
        avg_stop_loss,
        predicted_24h,
        predicted_48h,
        predicted_7d,
        predicted_change_24h,
        predicted_change_48h,
        predicted_change_7d,
        market_regime: input.regime.label,
        regime_confidence: input.regime.confidence,
        ai_reasoning,
        action_plan,
        risk_assessment,
        market_context,
        risk_note,
        timeframe_alignment_score: alignment_score,
        dominant_timeframe_regime: dominant_regime,
        onchain_signal: input.onchain.map(|o| o.overall_signal),
        social_sentiment_score: input.sentiment.map(|s| s.score),
        created_at: chrono::Utc::now(),
    })
}

fn build_refinement_prompt(input: &AggregationInput<'_>, direction: Direction, confidence: f64) -> String {
    format!(
        "coin={} direction={} confidence={:.2} regime={} long_bots={} short_bots={}",
        input.coin,
        direction,
        confidence,
        input.regime.label,
        input.votes.iter().filter(|v| v.direction == Direction::Long).count(),
        input.votes.iter().filter(|v| v.direction == Direction::Short).count(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BotCategory;

    fn vote(name: &str, category: BotCategory, direction: Direction, confidence: u8) -> BotVote {
        BotVote {
            bot_name: name.to_string(),
            bot_category: category,
            direction,
            confidence,
            entry: 100.0,
            take_profit: 110.0,
            stop_loss: 95.0,
            leverage: 2,
            rationale: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn empty_votes_produce_no_recommendation() {
        let input = AggregationInput {
            run_id: new_id(),
            coin: "BTC",
            ticker: "BTC",
            current_price: 100.0,
            votes: vec![],
            regime: Regime { label: RegimeLabel::Bull, confidence: 0.8 },
            timeframe_regimes: HashMap::new(),
            sentiment: None,
            onchain: None,
            bot_weights: &HashMap::new(),
            use_llm: false,
            confidence_threshold: 6.0,
        };
        assert!(aggregate(input, None).await.is_none());
    }

    #[tokio::test]
    async fn strong_long_consensus_produces_long_recommendation() {
        let votes = vec![
            vote("a", BotCategory::Trend, Direction::Long, 9),
            vote("b", BotCategory::Trend, Direction::Long, 9),
            vote("c", BotCategory::Momentum, Direction::Long, 8),
        ];
        let input = AggregationInput {
            run_id: new_id(),
            coin: "BTC",
            ticker: "BTC",
            current_price: 100.0,
            votes,
            regime: Regime { label: RegimeLabel::Bull, confidence: 0.8 },
            timeframe_regimes: HashMap::new(),
            sentiment: None,
            onchain: None,
            bot_weights: &HashMap::new(),
            use_llm: false,
            confidence_threshold: 6.0,
        };
        let rec = aggregate(input, None).await.unwrap();
        assert_eq!(rec.consensus_direction, Direction::Long);
        assert!(rec.avg_confidence > 0.0);
        assert_eq!(rec.long_bots, 3);
        assert_eq!(rec.short_bots, 0);
    }

    #[tokio::test]
    async fn contrarian_bloc_amplifies_confidence() {
        let votes_without = vec![
            vote("a", BotCategory::Trend, Direction::Long, 8),
            vote("b", BotCategory::Trend, Direction::Long, 8),
        ];
        let votes_with = vec![
            vote("a", BotCategory::Trend, Direction::Long, 8),
            vote("b", BotCategory::Trend, Direction::Long, 8),
            vote("c", BotCategory::Contrarian, Direction::Long, 7),
            vote("d", BotCategory::Contrarian, Direction::Long, 7),
            vote("e", BotCategory::Contrarian, Direction::Long, 7),
        ];
        let make_input = |votes: Vec<BotVote>| AggregationInput {
            run_id: new_id(),
            coin: "BTC",
            ticker: "BTC",
            current_price: 100.0,
            votes,
            regime: Regime { label: RegimeLabel::Bull, confidence: 0.8 },
            timeframe_regimes: HashMap::new(),
            sentiment: None,
            onchain: None,
            bot_weights: &HashMap::new(),
            use_llm: false,
            confidence_threshold: 6.0,
        };
        let without = aggregate(make_input(votes_without), None).await.unwrap();
        let with = aggregate(make_input(votes_with), None).await.unwrap();
        assert!(with.avg_confidence > without.avg_confidence);
    }

    #[tokio::test]
    async fn price_targets_are_signed_by_direction() {
        let votes = vec![
            vote("a", BotCategory::Trend, Direction::Short, 9),
            vote("b", BotCategory::Trend, Direction::Short, 9),
        ];
        let input = AggregationInput {
            run_id: new_id(),
            coin: "BTC",
            ticker: "BTC",
            current_price: 100.0,
            votes,
            regime: Regime { label: RegimeLabel::Bear, confidence: 0.8 },
            timeframe_regimes: HashMap::new(),
            sentiment: None,
            onchain: None,
            bot_weights: &HashMap::new(),
            use_llm: false,
            confidence_threshold: 6.0,
        };
        let rec = aggregate(input, None).await.unwrap();
        assert!(rec.predicted_change_24h < 0.0);
        assert!(rec.predicted_24h < rec.current_price);
    }
}
