// =============================================================================
// Vote construction helpers
// =============================================================================
//
// Every bot funnels its raw direction/confidence through `build_vote`, which
// enforces the §4.4 contract: finite positive entry/tp/sl, confidence
// clamped to [1,10], leverage clamped to [1, max_leverage], and a NaN/Inf
// check that forces abstain rather than persisting garbage.

use crate::types::{BotCategory, BotGuardrails, BotVote, Direction};

const DEFAULT_ATR_FALLBACK_PCT: f64 = 0.02;
const DEFAULT_TP_ATR_MULTIPLE: f64 = 2.0;
const DEFAULT_SL_ATR_MULTIPLE: f64 = 1.0;

/// Compute `(entry, take_profit, stop_loss)` from the current price, an
/// optional ATR reading, and a direction. Falls back to a fixed percentage
/// band when ATR is unavailable, so every bot can still stage levels without
/// fabricating a non-finite or negative value.
pub fn atr_levels(price: f64, atr: Option<f64>, direction: Direction) -> (f64, f64, f64) {
    let band = atr.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(price * DEFAULT_ATR_FALLBACK_PCT);
    let tp_dist = band * DEFAULT_TP_ATR_MULTIPLE;
    let sl_dist = band * DEFAULT_SL_ATR_MULTIPLE;

    match direction {
        Direction::Long => (price, price + tp_dist, (price - sl_dist).max(price * 0.001)),
        Direction::Short => (price, (price - tp_dist).max(price * 0.001), price + sl_dist),
    }
}

/// Build a validated `BotVote`, or `None` if any computed value is
/// non-finite/non-positive (forces abstain per §4.4).
#[allow(clippy::too_many_arguments)]
pub fn build_vote(
    bot_name: &str,
    bot_category: BotCategory,
    direction: Direction,
    confidence: f64,
    price: f64,
    atr: Option<f64>,
    leverage: u8,
    max_leverage: u8,
    rationale: String,
) -> Option<BotVote> {
    if !confidence.is_finite() || !price.is_finite() || price <= 0.0 {
        return None;
    }

    let (entry, take_profit, stop_loss) = atr_levels(price, atr, direction);
    if ![entry, take_profit, stop_loss].iter().all(|v| v.is_finite() && *v > 0.0) {
        return None;
    }

    let confidence_int = confidence.round().clamp(1.0, 10.0) as u8;
    let leverage = leverage.clamp(1, max_leverage.max(1));

    Some(BotVote {
        bot_name: bot_name.to_string(),
        bot_category,
        direction,
        confidence: confidence_int,
        entry,
        take_profit,
        stop_loss,
        leverage,
        rationale,
    })
}

/// Re-applies a bot's *current* guardrails to a vote it already produced
/// (§4.8): a bot on probation votes with a lower leverage ceiling, a tighter
/// stop, and can be silenced outright if its confidence falls under the
/// probation floor. Returns `None` when the guardrail floor rejects the
/// vote outright.
pub fn apply_guardrails(vote: BotVote, guardrails: &BotGuardrails) -> Option<BotVote> {
    if (vote.confidence as f64 / 10.0) < guardrails.min_confidence_required {
        return None;
    }

    let leverage = vote.leverage.min(guardrails.max_leverage.max(1));
    let stop_loss = match vote.direction {
        Direction::Long => vote.entry - (vote.entry - vote.stop_loss) * guardrails.stop_loss_multiplier,
        Direction::Short => vote.entry + (vote.stop_loss - vote.entry) * guardrails.stop_loss_multiplier,
    };

    Some(BotVote { leverage, stop_loss, ..vote })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atr_levels_long_orders_correctly() {
        let (entry, tp, sl) = atr_levels(100.0, Some(2.0), Direction::Long);
        assert_eq!(entry, 100.0);
        assert!(tp > entry);
        assert!(sl < entry);
    }

    #[test]
    fn atr_levels_short_orders_correctly() {
        let (entry, tp, sl) = atr_levels(100.0, Some(2.0), Direction::Short);
        assert_eq!(entry, 100.0);
        assert!(tp < entry);
        assert!(sl > entry);
    }

    #[test]
    fn atr_levels_falls_back_without_atr() {
        let (entry, tp, sl) = atr_levels(100.0, None, Direction::Long);
        assert_eq!(entry, 100.0);
        assert!(tp > entry && sl < entry);
    }

    #[test]
    fn build_vote_rejects_non_finite_confidence() {
        let v = build_vote(
            "test",
            BotCategory::Trend,
            Direction::Long,
            f64::NAN,
            100.0,
            Some(1.0),
            2,
            5,
            "test".to_string(),
        );
        assert!(v.is_none());
    }

    #[test]
    fn build_vote_clamps_confidence_and_leverage() {
        let v = build_vote(
            "test",
            BotCategory::Trend,
            Direction::Long,
            15.0,
            100.0,
            Some(1.0),
            9,
            5,
            "test".to_string(),
        )
        .unwrap();
        assert_eq!(v.confidence, 10);
        assert_eq!(v.leverage, 5);
    }

    fn sample_vote(confidence: u8, leverage: u8) -> BotVote {
        BotVote {
            bot_name: "test".to_string(),
            bot_category: BotCategory::Trend,
            direction: Direction::Long,
            confidence,
            entry: 100.0,
            take_profit: 110.0,
            stop_loss: 90.0,
            leverage,
            rationale: "test".to_string(),
        }
    }

    #[test]
    fn guardrails_drop_votes_under_the_confidence_floor() {
        let guardrails = BotGuardrails::probation();
        let vote = sample_vote(6, 4);
        assert!(apply_guardrails(vote, &guardrails).is_none());
    }

    #[test]
    fn guardrails_cap_leverage_and_tighten_the_stop() {
        let guardrails = BotGuardrails::probation();
        let vote = sample_vote(8, 4);
        let adjusted = apply_guardrails(vote, &guardrails).unwrap();
        assert_eq!(adjusted.leverage, 3);
        assert_eq!(adjusted.stop_loss, 95.0);
    }

    #[test]
    fn default_guardrails_pass_votes_through_unchanged_besides_leverage_cap() {
        let guardrails = BotGuardrails::default();
        let vote = sample_vote(5, 3);
        let adjusted = apply_guardrails(vote, &guardrails).unwrap();
        assert_eq!(adjusted.leverage, 3);
        assert_eq!(adjusted.stop_loss, 90.0);
    }
}
