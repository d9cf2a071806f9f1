// =============================================================================
// Regime × category confidence multiplier table
// =============================================================================

use crate::types::{BotCategory, RegimeLabel};

/// Multiplier applied to a vote's confidence based on how well its bot
/// category fits the current market regime.
pub fn regime_category_weight(category: BotCategory, regime: RegimeLabel) -> f64 {
    use BotCategory::*;
    use RegimeLabel::*;

    match (category, regime) {
        (Trend, Bull) | (Trend, Bear) => 1.3,
        (Trend, Sideways) => 0.7,
        (Trend, Volatile) => 0.9,

        (MeanReversion, Bull) | (MeanReversion, Bear) => 0.7,
        (MeanReversion, Sideways) => 1.3,
        (MeanReversion, Volatile) => 0.9,

        (Momentum, Bull) | (Momentum, Bear) => 1.2,
        (Momentum, Sideways) => 0.8,
        (Momentum, Volatile) => 1.0,

        (Volume, Volatile) => 1.2,
        (Volume, _) => 1.0,

        (Volatility, Volatile) => 1.4,
        (Volatility, _) => 0.9,

        (Contrarian, Bull) | (Contrarian, Bear) => 0.8,
        (Contrarian, Sideways) => 1.1,
        (Contrarian, Volatile) => 1.0,

        (Derivatives, Volatile) | (Derivatives, Bull) | (Derivatives, Bear) => 1.1,
        (Derivatives, Sideways) => 1.0,

        (OnChain, _) | (Sentiment, _) => 1.0,

        // Pattern, Specialized, Ai are not named in the table; treated as
        // regime-neutral like on_chain/sentiment.
        (Pattern, _) | (Specialized, _) | (Ai, _) => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_favors_directional_regimes() {
        assert_eq!(regime_category_weight(BotCategory::Trend, RegimeLabel::Bull), 1.3);
        assert_eq!(regime_category_weight(BotCategory::Trend, RegimeLabel::Sideways), 0.7);
    }

    #[test]
    fn mean_reversion_favors_sideways() {
        assert_eq!(regime_category_weight(BotCategory::MeanReversion, RegimeLabel::Sideways), 1.3);
        assert_eq!(regime_category_weight(BotCategory::MeanReversion, RegimeLabel::Bull), 0.7);
    }

    #[test]
    fn volatility_favors_volatile_regime() {
        assert_eq!(regime_category_weight(BotCategory::Volatility, RegimeLabel::Volatile), 1.4);
    }

    #[test]
    fn onchain_and_sentiment_are_regime_neutral() {
        for regime in [RegimeLabel::Bull, RegimeLabel::Bear, RegimeLabel::Sideways, RegimeLabel::Volatile] {
            assert_eq!(regime_category_weight(BotCategory::OnChain, regime), 1.0);
            assert_eq!(regime_category_weight(BotCategory::Sentiment, regime), 1.0);
        }
    }
}
