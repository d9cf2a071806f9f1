// =============================================================================
// Confidence gating, regime weighting, and weighted tallies (steps 1-4)
// =============================================================================

use std::collections::HashMap;

use crate::aggregation::weights::regime_category_weight;
use crate::types::{BotVote, Direction, RegimeLabel};

const STRONG_CONSENSUS_AGREEMENT: f64 = 0.80;
const WEAK_CONSENSUS_AGREEMENT: f64 = 0.50;
const STRONG_CONSENSUS_BOOST: f64 = 1.15;
const WEAK_CONSENSUS_PENALTY: f64 = 0.7;

#[derive(Debug, Clone)]
pub struct EffectiveVote {
    pub vote: BotVote,
    pub effective_confidence: f64,
}

pub struct TallyResult {
    pub direction: Direction,
    pub long_score: f64,
    pub short_score: f64,
    pub winning_votes: Vec<EffectiveVote>,
    pub agreement: f64,
}

/// Step 1: drop votes below the per-scan confidence floor (`ScanSpec::confidence_threshold`).
pub fn gate_confidence(votes: Vec<BotVote>, confidence_threshold: f64) -> Vec<BotVote> {
    votes.into_iter().filter(|v| (v.confidence as f64) >= confidence_threshold).collect()
}

/// Step 2: multiply each vote's confidence by its category/regime weight,
/// clamped to the persisted confidence domain.
pub fn apply_regime_weighting(votes: Vec<BotVote>, regime: RegimeLabel) -> Vec<EffectiveVote> {
    votes
        .into_iter()
        .map(|vote| {
            let multiplier = regime_category_weight(vote.bot_category, regime);
            let effective_confidence = (vote.confidence as f64 * multiplier).clamp(1.0, 10.0);
            EffectiveVote { vote, effective_confidence }
        })
        .collect()
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

/// Steps 3-4: weighted tally per direction, tie-break on median confidence,
/// and the consensus-tier multiplier on the winning side's agreement ratio.
/// Returns the winning direction, its votes, and the confidence multiplier
/// from the consensus tier (plus whether it triggered HIGH_UNCERTAINTY).
pub fn weighted_tally(
    votes: &[EffectiveVote],
    bot_weights: &HashMap<String, f64>,
) -> Option<(TallyResult, f64, bool)> {
    if votes.is_empty() {
        return None;
    }

    let mut long_score = 0.0;
    let mut short_score = 0.0;
    for v in votes {
        let bot_weight = bot_weights.get(&v.vote.bot_name).copied().unwrap_or(1.0);
        let contribution = v.effective_confidence * bot_weight;
        match v.vote.direction {
            Direction::Long => long_score += contribution,
            Direction::Short => short_score += contribution,
        }
    }

    let direction = if (long_score - short_score).abs() < 1e-9 {
        let long_median = median(votes.iter().filter(|v| v.vote.direction == Direction::Long).map(|v| v.vote.confidence as f64).collect());
        let short_median = median(votes.iter().filter(|v| v.vote.direction == Direction::Short).map(|v| v.vote.confidence as f64).collect());
        if long_median >= short_median {
            Direction::Long
        } else {
            Direction::Short
        }
    } else if long_score > short_score {
        Direction::Long
    } else {
        Direction::Short
    };

    let winning_votes: Vec<EffectiveVote> = votes.iter().filter(|v| v.vote.direction == direction).cloned().collect();
    if winning_votes.is_empty() {
        return None;
    }

    let total = long_score + short_score;
    let agreement = if total > 0.0 { long_score.max(short_score) / total } else { 0.0 };

    let (multiplier, high_uncertainty) = if agreement >= STRONG_CONSENSUS_AGREEMENT {
        (STRONG_CONSENSUS_BOOST, false)
    } else if agreement < WEAK_CONSENSUS_AGREEMENT {
        (WEAK_CONSENSUS_PENALTY, true)
    } else {
        (1.0, false)
    };

    Some((TallyResult { direction, long_score, short_score, winning_votes, agreement }, multiplier, high_uncertainty))
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

    #[test]
    fn gate_drops_low_confidence_votes() {
        let votes = vec![
            vote("a", BotCategory::Trend, Direction::Long, 5),
            vote("b", BotCategory::Trend, Direction::Long, 6),
        ];
        let gated = gate_confidence(votes, 6.0);
        assert_eq!(gated.len(), 1);
        assert_eq!(gated[0].bot_name, "b");
    }

    #[test]
    fn tally_picks_higher_score_side() {
        let votes = vec![
            vote("a", BotCategory::Trend, Direction::Long, 9),
            vote("b", BotCategory::Trend, Direction::Long, 9),
            vote("c", BotCategory::MeanReversion, Direction::Short, 6),
        ];
        let effective = apply_regime_weighting(votes, RegimeLabel::Bull);
        let (result, _, _) = weighted_tally(&effective, &HashMap::new()).unwrap();
        assert_eq!(result.direction, Direction::Long);
    }

    #[test]
    fn strong_consensus_triggers_boost() {
        let votes = vec![
            vote("a", BotCategory::Trend, Direction::Long, 9),
            vote("b", BotCategory::Trend, Direction::Long, 9),
            vote("c", BotCategory::Trend, Direction::Long, 9),
        ];
        let effective = apply_regime_weighting(votes, RegimeLabel::Bull);
        let (_, multiplier, high_uncertainty) = weighted_tally(&effective, &HashMap::new()).unwrap();
        assert_eq!(multiplier, STRONG_CONSENSUS_BOOST);
        assert!(!high_uncertainty);
    }

    #[test]
    fn weak_consensus_triggers_penalty_and_flag() {
        let votes = vec![
            vote("a", BotCategory::Trend, Direction::Long, 6),
            vote("b", BotCategory::MeanReversion, Direction::Short, 6),
        ];
        let effective = apply_regime_weighting(votes, RegimeLabel::Sideways);
        let (_, multiplier, high_uncertainty) = weighted_tally(&effective, &HashMap::new()).unwrap();
        assert_eq!(multiplier, WEAK_CONSENSUS_PENALTY);
        assert!(high_uncertainty);
    }
}
