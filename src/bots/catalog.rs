// =============================================================================
// Bot catalog — ~60 concrete bots across twelve categories
// =============================================================================
//
// Data-driven: each entry instantiates a shared shape (`bots::shapes`) with
// a distinct parameter set, the same style as `arena::profile::default_profiles`.
// The count (60) sits inside the 54-87 range; it is configuration, not a
// hard-coded constant callers depend on.

use std::sync::Arc;

use crate::bots::shapes::*;
use crate::bots::Bot;

/// Build the full bot catalog.
pub fn build_catalog() -> Vec<Arc<dyn Bot>> {
    let mut bots: Vec<Arc<dyn Bot>> = Vec::new();

    // --- Trend (6) -----------------------------------------------------------
    for (i, adx_min) in [20.0, 23.0, 26.0, 28.0, 31.0, 35.0].into_iter().enumerate() {
        bots.push(Arc::new(TrendFollowing {
            name: format!("trend_rider_{}", i + 1),
            adx_min,
            max_leverage: 5,
        }));
    }

    // --- Mean reversion (6) ----------------------------------------------------
    for (i, (oversold, overbought)) in [
        (30.0, 70.0),
        (25.0, 75.0),
        (20.0, 80.0),
        (28.0, 72.0),
        (22.0, 78.0),
        (32.0, 68.0),
    ]
    .into_iter()
    .enumerate()
    {
        bots.push(Arc::new(MeanReversion {
            name: format!("mean_reversion_{}", i + 1),
            rsi_oversold: oversold,
            rsi_overbought: overbought,
            max_leverage: 4,
        }));
    }

    // --- Momentum (5) ------------------------------------------------------
    for (i, hist_threshold) in [0.05, 0.1, 0.2, 0.3, 0.5].into_iter().enumerate() {
        bots.push(Arc::new(MomentumConfirmation {
            name: format!("momentum_macd_{}", i + 1),
            hist_threshold,
            max_leverage: 5,
        }));
    }

    // --- Volume (5) ----------------------------------------------------------
    for (i, min_deviation_pct) in [0.25, 0.5, 0.75, 1.0, 1.5].into_iter().enumerate() {
        bots.push(Arc::new(VolumeConfirmation {
            name: format!("volume_obv_vwap_{}", i + 1),
            min_deviation_pct,
            max_leverage: 3,
        }));
    }

    // --- Volatility (6: 3 band-width + 3 SAR) ---------------------------------
    for (i, width_threshold) in [3.0, 4.0, 5.0].into_iter().enumerate() {
        bots.push(Arc::new(VolatilityExpansion {
            name: format!("volatility_bbw_{}", i + 1),
            width_threshold,
            max_leverage: 4,
        }));
    }
    for (i, min_distance_pct) in [0.3, 0.6, 1.0].into_iter().enumerate() {
        bots.push(Arc::new(SarBreakout {
            name: format!("volatility_sar_{}", i + 1),
            min_distance_pct,
            max_leverage: 4,
        }));
    }

    // --- Pattern (5) -----------------------------------------------------------
    for (i, min_cloud_thickness_pct) in [0.2, 0.4, 0.6, 0.8, 1.2].into_iter().enumerate() {
        bots.push(Arc::new(IchimokuCloudPosition {
            name: format!("pattern_ichimoku_{}", i + 1),
            min_cloud_thickness_pct,
            max_leverage: 3,
        }));
    }

    // --- Derivatives (5: 3 funding + 2 long/short ratio) ----------------------
    for (i, funding_threshold_pct) in [0.03, 0.05, 0.08].into_iter().enumerate() {
        bots.push(Arc::new(DerivativesBias {
            name: format!("derivatives_funding_{}", i + 1),
            funding_threshold_pct,
            max_leverage: 5,
        }));
    }
    for (i, ratio_threshold) in [1.5, 2.0].into_iter().enumerate() {
        bots.push(Arc::new(LongShortRatioBias {
            name: format!("derivatives_ls_ratio_{}", i + 1),
            ratio_threshold,
            max_leverage: 5,
        }));
    }

    // --- Contrarian (4) --------------------------------------------------------
    for (i, (rsi_lo, rsi_hi, w_lo, w_hi)) in [
        (20.0, 80.0, -85.0, -15.0),
        (15.0, 85.0, -90.0, -10.0),
        (25.0, 75.0, -80.0, -20.0),
        (18.0, 82.0, -88.0, -12.0),
    ]
    .into_iter()
    .enumerate()
    {
        bots.push(Arc::new(ContrarianFade {
            name: format!("contrarian_fade_{}", i + 1),
            rsi_extreme_low: rsi_lo,
            rsi_extreme_high: rsi_hi,
            williams_extreme_low: w_lo,
            williams_extreme_high: w_hi,
            max_leverage: 3,
        }));
    }

    // --- On-chain (4) ------------------------------------------------------------
    for (i, min_strength) in [0.1, 0.2, 0.3, 0.4].into_iter().enumerate() {
        bots.push(Arc::new(OnChainBias {
            name: format!("onchain_bias_{}", i + 1),
            min_strength,
            max_leverage: 3,
        }));
    }

    // --- Sentiment (4) -----------------------------------------------------------
    for (i, min_abs_score) in [0.2, 0.3, 0.4, 0.5].into_iter().enumerate() {
        bots.push(Arc::new(SentimentBias {
            name: format!("sentiment_bias_{}", i + 1),
            min_abs_score,
            max_leverage: 3,
        }));
    }

    // --- Specialized (5) -------------------------------------------------------
    for (i, adx_min) in [25.0, 28.0, 30.0, 33.0, 36.0].into_iter().enumerate() {
        bots.push(Arc::new(CompositeConfluence {
            name: format!("specialized_confluence_{}", i + 1),
            adx_min,
            max_leverage: 5,
        }));
    }

    // --- AI (4) --------------------------------------------------------------
    for (i, threshold) in [0.15, 0.2, 0.25, 0.3].into_iter().enumerate() {
        bots.push(Arc::new(AiContext {
            name: format!("ai_context_{}", i + 1),
            threshold,
            max_leverage: 3,
        }));
    }

    bots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_size_within_spec_range() {
        let bots = build_catalog();
        assert!(bots.len() >= 54 && bots.len() <= 87, "catalog size {} out of range", bots.len());
    }

    #[test]
    fn catalog_names_are_unique() {
        let bots = build_catalog();
        let mut names: Vec<&str> = bots.iter().map(|b| b.name()).collect();
        names.sort_unstable();
        let unique_count = {
            let mut n = names.clone();
            n.dedup();
            n.len()
        };
        assert_eq!(unique_count, names.len(), "catalog contains duplicate bot names");
    }

    #[test]
    fn catalog_covers_all_twelve_categories() {
        use crate::types::BotCategory;
        let bots = build_catalog();
        let categories = [
            BotCategory::Trend,
            BotCategory::MeanReversion,
            BotCategory::Momentum,
            BotCategory::Volume,
            BotCategory::Volatility,
            BotCategory::Pattern,
            BotCategory::Derivatives,
            BotCategory::Contrarian,
            BotCategory::OnChain,
            BotCategory::Sentiment,
            BotCategory::Specialized,
            BotCategory::Ai,
        ];
        for cat in categories {
            assert!(bots.iter().any(|b| b.category() == cat), "missing category {cat}");
        }
    }
}
