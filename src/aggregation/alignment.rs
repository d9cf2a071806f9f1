// =============================================================================
// Multi-timeframe alignment scoring (step 6)
// =============================================================================

use std::collections::HashMap;

use crate::types::{Direction, RegimeLabel, Timeframe};

pub const ALIGNMENT_TIMEFRAMES: [Timeframe; 4] =
    [Timeframe::OneHour, Timeframe::FourHour, Timeframe::OneDay, Timeframe::OneWeek];

fn regime_matches(regime: RegimeLabel, direction: Direction) -> bool {
    matches!(
        (regime, direction),
        (RegimeLabel::Bull, Direction::Long) | (RegimeLabel::Bear, Direction::Short)
    )
}

/// Score = count of aligned timeframes out of 4, mapped onto {0,25,50,75,100}.
/// Boost is the corresponding confidence multiplier.
pub fn alignment_score_and_boost(
    regimes: &HashMap<Timeframe, RegimeLabel>,
    direction: Direction,
) -> (u8, f64) {
    let matches = ALIGNMENT_TIMEFRAMES
        .iter()
        .filter(|tf| regimes.get(*tf).is_some_and(|regime| regime_matches(*regime, direction)))
        .count();

    match matches {
        4 => (100, 1.30),
        3 => (75, 1.20),
        2 => (50, 1.00),
        1 => (25, 0.90),
        _ => (0, 0.80),
    }
}

/// The regime whose timeframe shows the strongest same-direction agreement;
/// used to populate `dominant_timeframe_regime`. Ties favor the longer
/// timeframe (more weight given to structural trend over noise).
pub fn dominant_regime(regimes: &HashMap<Timeframe, RegimeLabel>, fallback: RegimeLabel) -> RegimeLabel {
    for tf in ALIGNMENT_TIMEFRAMES.iter().rev() {
        if let Some(regime) = regimes.get(tf) {
            return *regime;
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_timeframes(label: RegimeLabel) -> HashMap<Timeframe, RegimeLabel> {
        ALIGNMENT_TIMEFRAMES.iter().map(|tf| (*tf, label)).collect()
    }

    #[test]
    fn full_alignment_scores_100() {
        let regimes = all_timeframes(RegimeLabel::Bull);
        let (score, boost) = alignment_score_and_boost(&regimes, Direction::Long);
        assert_eq!(score, 100);
        assert_eq!(boost, 1.30);
    }

    #[test]
    fn no_alignment_scores_zero() {
        let regimes = all_timeframes(RegimeLabel::Sideways);
        let (score, boost) = alignment_score_and_boost(&regimes, Direction::Long);
        assert_eq!(score, 0);
        assert_eq!(boost, 0.80);
    }

    #[test]
    fn partial_alignment_scores_between() {
        let mut regimes = all_timeframes(RegimeLabel::Bull);
        regimes.insert(Timeframe::OneWeek, RegimeLabel::Sideways);
        let (score, _) = alignment_score_and_boost(&regimes, Direction::Long);
        assert_eq!(score, 75);
    }

    #[test]
    fn dominant_regime_prefers_longest_timeframe() {
        let mut regimes = HashMap::new();
        regimes.insert(Timeframe::OneHour, RegimeLabel::Bull);
        regimes.insert(Timeframe::OneWeek, RegimeLabel::Bear);
        assert_eq!(dominant_regime(&regimes, RegimeLabel::Sideways), RegimeLabel::Bear);
    }
}
