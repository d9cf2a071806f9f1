// =============================================================================
// Bot shapes — reusable indicator-threshold templates
// =============================================================================
//
// Every shape is a plain struct parameterized by thresholds/periods so that
// many distinct catalog entries can share one `analyze` implementation while
// still being genuinely independent bots (different trigger points, not
// clones voting in lockstep).

use crate::bots::votes::build_vote;
use crate::bots::{Bot, BotContext};
use crate::types::{BotCategory, BotVote, Direction, DirectionalSignal, ObvTrend};

fn confidence_from_strength(strength: f64, lo: f64, hi: f64, min_conf: f64, max_conf: f64) -> f64 {
    let t = if (hi - lo).abs() < f64::EPSILON {
        0.5
    } else {
        ((strength - lo) / (hi - lo)).clamp(0.0, 1.0)
    };
    min_conf + t * (max_conf - min_conf)
}

/// Votes LONG when the EMA20/50/200 stack is bullishly aligned and ADX
/// confirms trend strength; SHORT on the mirrored bearish alignment.
pub struct TrendFollowing {
    pub name: String,
    pub adx_min: f64,
    pub max_leverage: u8,
}

impl Bot for TrendFollowing {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> BotCategory {
        BotCategory::Trend
    }
    fn analyze(&self, ctx: &BotContext) -> Option<BotVote> {
        let ema = ctx.features.ema?;
        let adx = ctx.features.adx?;
        if adx < self.adx_min {
            return None;
        }

        let direction = if ema.ema20 > ema.ema50 && ema.ema50 > ema.ema200 {
            Direction::Long
        } else if ema.ema20 < ema.ema50 && ema.ema50 < ema.ema200 {
            Direction::Short
        } else {
            return None;
        };

        let confidence = confidence_from_strength(adx, self.adx_min, self.adx_min + 30.0, 6.0, 9.5);
        build_vote(
            &self.name,
            BotCategory::Trend,
            direction,
            confidence,
            ctx.features.price,
            ctx.features.atr,
            2,
            self.max_leverage,
            format!("EMA stack aligned {direction}, ADX {adx:.1} >= {:.1}", self.adx_min),
        )
    }
}

/// Votes LONG when RSI is oversold and price sits at/below the lower
/// Bollinger band; SHORT on the mirrored overbought condition.
pub struct MeanReversion {
    pub name: String,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub max_leverage: u8,
}

impl Bot for MeanReversion {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> BotCategory {
        BotCategory::MeanReversion
    }
    fn analyze(&self, ctx: &BotContext) -> Option<BotVote> {
        let rsi = ctx.features.rsi?;
        let bb = ctx.features.bollinger?;
        let price = ctx.features.price;

        let direction = if rsi <= self.rsi_oversold && price <= bb.lower {
            Direction::Long
        } else if rsi >= self.rsi_overbought && price >= bb.upper {
            Direction::Short
        } else {
            return None;
        };

        let extremity = match direction {
            Direction::Long => self.rsi_oversold - rsi,
            Direction::Short => rsi - self.rsi_overbought,
        };
        let confidence = confidence_from_strength(extremity, 0.0, 15.0, 6.0, 9.0);
        build_vote(
            &self.name,
            BotCategory::MeanReversion,
            direction,
            confidence,
            price,
            ctx.features.atr,
            1,
            self.max_leverage,
            format!("RSI {rsi:.1} at band extreme, fading to mean"),
        )
    }
}

/// Votes on MACD histogram sign and magnitude — momentum confirmation.
pub struct MomentumConfirmation {
    pub name: String,
    pub hist_threshold: f64,
    pub max_leverage: u8,
}

impl Bot for MomentumConfirmation {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> BotCategory {
        BotCategory::Momentum
    }
    fn analyze(&self, ctx: &BotContext) -> Option<BotVote> {
        let macd = ctx.features.macd?;
        let direction = if macd.hist > self.hist_threshold {
            Direction::Long
        } else if macd.hist < -self.hist_threshold {
            Direction::Short
        } else {
            return None;
        };

        let confidence = confidence_from_strength(macd.hist.abs(), self.hist_threshold, self.hist_threshold * 6.0, 6.0, 9.0);
        build_vote(
            &self.name,
            BotCategory::Momentum,
            direction,
            confidence,
            ctx.features.price,
            ctx.features.atr,
            2,
            self.max_leverage,
            format!("MACD histogram {:.4} confirms momentum", macd.hist),
        )
    }
}

/// Votes with OBV trend confirmed by price position relative to VWAP.
pub struct VolumeConfirmation {
    pub name: String,
    pub min_deviation_pct: f64,
    pub max_leverage: u8,
}

impl Bot for VolumeConfirmation {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> BotCategory {
        BotCategory::Volume
    }
    fn analyze(&self, ctx: &BotContext) -> Option<BotVote> {
        let obv_trend = ctx.features.obv_trend?;
        let vwap = ctx.features.vwap?;
        let price = ctx.features.price;

        let direction = match obv_trend {
            ObvTrend::Rising if price > vwap => Direction::Long,
            ObvTrend::Falling if price < vwap => Direction::Short,
            _ => return None,
        };

        let deviation_pct = ((price - vwap) / vwap).abs() * 100.0;
        if deviation_pct < self.min_deviation_pct {
            return None;
        }
        let confidence = confidence_from_strength(deviation_pct, self.min_deviation_pct, self.min_deviation_pct + 3.0, 6.0, 8.5);
        build_vote(
            &self.name,
            BotCategory::Volume,
            direction,
            confidence,
            price,
            ctx.features.atr,
            1,
            self.max_leverage,
            "OBV trend confirmed by VWAP position".to_string(),
        )
    }
}

/// Votes on Bollinger Band Width expansion — volatility breakout direction
/// determined by price position relative to the middle band.
pub struct VolatilityExpansion {
    pub name: String,
    pub width_threshold: f64,
    pub max_leverage: u8,
}

impl Bot for VolatilityExpansion {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> BotCategory {
        BotCategory::Volatility
    }
    fn analyze(&self, ctx: &BotContext) -> Option<BotVote> {
        let bb = ctx.features.bollinger?;
        if bb.width < self.width_threshold {
            return None;
        }
        let price = ctx.features.price;
        let direction = if price > bb.mid { Direction::Long } else { Direction::Short };

        let confidence = confidence_from_strength(bb.width, self.width_threshold, self.width_threshold * 3.0, 6.0, 9.0);
        build_vote(
            &self.name,
            BotCategory::Volatility,
            direction,
            confidence,
            price,
            ctx.features.atr,
            2,
            self.max_leverage,
            format!("Band width {:.2} signals volatility expansion", bb.width),
        )
    }
}

/// Votes on a Parabolic SAR flip — price crossing above/below the stop line.
pub struct SarBreakout {
    pub name: String,
    pub min_distance_pct: f64,
    pub max_leverage: u8,
}

impl Bot for SarBreakout {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> BotCategory {
        BotCategory::Volatility
    }
    fn analyze(&self, ctx: &BotContext) -> Option<BotVote> {
        let sar = ctx.features.parabolic_sar?;
        let price = ctx.features.price;
        let direction = if price > sar { Direction::Long } else { Direction::Short };

        let distance_pct = ((price - sar) / sar).abs() * 100.0;
        if distance_pct < self.min_distance_pct {
            return None;
        }
        let confidence = confidence_from_strength(distance_pct, self.min_distance_pct, self.min_distance_pct + 2.0, 6.0, 8.5);
        build_vote(
            &self.name,
            BotCategory::Volatility,
            direction,
            confidence,
            price,
            ctx.features.atr,
            2,
            self.max_leverage,
            "Price/SAR relationship signals breakout direction".to_string(),
        )
    }
}

/// Votes on price position relative to the Ichimoku cloud.
pub struct IchimokuCloudPosition {
    pub name: String,
    pub min_cloud_thickness_pct: f64,
    pub max_leverage: u8,
}

impl Bot for IchimokuCloudPosition {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> BotCategory {
        BotCategory::Pattern
    }
    fn analyze(&self, ctx: &BotContext) -> Option<BotVote> {
        let ichimoku = ctx.features.ichimoku?;
        let price = ctx.features.price;
        let cloud_top = ichimoku.senkou_a.max(ichimoku.senkou_b);
        let cloud_bottom = ichimoku.senkou_a.min(ichimoku.senkou_b);

        let direction = if price > cloud_top && ichimoku.senkou_a > ichimoku.senkou_b {
            Direction::Long
        } else if price < cloud_bottom && ichimoku.senkou_a < ichimoku.senkou_b {
            Direction::Short
        } else {
            return None;
        };

        let cloud_thickness_pct = ((cloud_top - cloud_bottom) / price).abs() * 100.0;
        if cloud_thickness_pct < self.min_cloud_thickness_pct {
            return None;
        }
        let confidence = confidence_from_strength(cloud_thickness_pct, self.min_cloud_thickness_pct, self.min_cloud_thickness_pct + 2.0, 6.0, 8.5);
        build_vote(
            &self.name,
            BotCategory::Pattern,
            direction,
            confidence,
            price,
            ctx.features.atr,
            1,
            self.max_leverage,
            "Price/cloud relationship forms a directional pattern".to_string(),
        )
    }
}

/// Votes on funding-rate extremes: very positive funding (crowded longs)
/// fades short; very negative funding fades long.
pub struct DerivativesBias {
    pub name: String,
    pub funding_threshold_pct: f64,
    pub max_leverage: u8,
}

impl Bot for DerivativesBias {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> BotCategory {
        BotCategory::Derivatives
    }
    fn analyze(&self, ctx: &BotContext) -> Option<BotVote> {
        let derivatives = ctx.derivatives?;
        let funding = derivatives.funding_rate?;

        let direction = if funding > self.funding_threshold_pct {
            Direction::Short
        } else if funding < -self.funding_threshold_pct {
            Direction::Long
        } else {
            return None;
        };

        let confidence = confidence_from_strength(funding.abs(), self.funding_threshold_pct, self.funding_threshold_pct * 4.0, 6.0, 9.0);
        build_vote(
            &self.name,
            BotCategory::Derivatives,
            direction,
            confidence,
            ctx.features.price,
            ctx.features.atr,
            2,
            self.max_leverage,
            format!("Funding rate {funding:.4}% signals crowded positioning"),
        )
    }
}

/// Votes on open-interest-confirmed long/short ratio extremes.
pub struct LongShortRatioBias {
    pub name: String,
    pub ratio_threshold: f64,
    pub max_leverage: u8,
}

impl Bot for LongShortRatioBias {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> BotCategory {
        BotCategory::Derivatives
    }
    fn analyze(&self, ctx: &BotContext) -> Option<BotVote> {
        let derivatives = ctx.derivatives?;
        let ratio = derivatives.long_short_ratio?;

        let direction = if ratio > self.ratio_threshold {
            Direction::Short
        } else if ratio < 1.0 / self.ratio_threshold {
            Direction::Long
        } else {
            return None;
        };

        let deviation = (ratio - 1.0).abs();
        let confidence = confidence_from_strength(deviation, self.ratio_threshold - 1.0, (self.ratio_threshold - 1.0) * 3.0, 6.0, 8.5);
        build_vote(
            &self.name,
            BotCategory::Derivatives,
            direction,
            confidence,
            ctx.features.price,
            ctx.features.atr,
            2,
            self.max_leverage,
            format!("Long/short ratio {ratio:.2} signals crowded positioning"),
        )
    }
}

/// Fades extreme RSI/Williams%R readings more aggressively than
/// `MeanReversion` — requires both oscillators to agree at the extreme.
pub struct ContrarianFade {
    pub name: String,
    pub rsi_extreme_low: f64,
    pub rsi_extreme_high: f64,
    pub williams_extreme_low: f64,
    pub williams_extreme_high: f64,
    pub max_leverage: u8,
}

impl Bot for ContrarianFade {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> BotCategory {
        BotCategory::Contrarian
    }
    fn analyze(&self, ctx: &BotContext) -> Option<BotVote> {
        let rsi = ctx.features.rsi?;
        let williams_r = ctx.features.williams_r?;

        let direction = if rsi <= self.rsi_extreme_low && williams_r <= self.williams_extreme_low {
            Direction::Long
        } else if rsi >= self.rsi_extreme_high && williams_r >= self.williams_extreme_high {
            Direction::Short
        } else {
            return None;
        };

        let confidence = confidence_from_strength(rsi.min(100.0 - rsi), 0.0, self.rsi_extreme_low, 9.5, 7.0);
        build_vote(
            &self.name,
            BotCategory::Contrarian,
            direction,
            confidence,
            ctx.features.price,
            ctx.features.atr,
            1,
            self.max_leverage,
            "Dual-oscillator extreme fade".to_string(),
        )
    }
}

/// Votes directly from the on-chain directional signal.
pub struct OnChainBias {
    pub name: String,
    pub min_strength: f64,
    pub max_leverage: u8,
}

impl Bot for OnChainBias {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> BotCategory {
        BotCategory::OnChain
    }
    fn analyze(&self, ctx: &BotContext) -> Option<BotVote> {
        let onchain = ctx.onchain?;
        let direction = match onchain.overall_signal {
            DirectionalSignal::Bullish => Direction::Long,
            DirectionalSignal::Bearish => Direction::Short,
            DirectionalSignal::Neutral => return None,
        };

        let strength = onchain
            .whale_activity
            .map(f64::abs)
            .unwrap_or(0.5)
            .max(onchain.exchange_flows.map(f64::abs).unwrap_or(0.5));
        if strength < self.min_strength {
            return None;
        }
        let confidence = confidence_from_strength(strength, self.min_strength, 1.0, 6.0, 8.5);
        build_vote(
            &self.name,
            BotCategory::OnChain,
            direction,
            confidence,
            ctx.features.price,
            ctx.features.atr,
            1,
            self.max_leverage,
            format!("On-chain signal {}", onchain.overall_signal),
        )
    }
}

/// Votes from the aggregated social sentiment classification.
pub struct SentimentBias {
    pub name: String,
    pub min_abs_score: f64,
    pub max_leverage: u8,
}

impl Bot for SentimentBias {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> BotCategory {
        BotCategory::Sentiment
    }
    fn analyze(&self, ctx: &BotContext) -> Option<BotVote> {
        let sentiment = ctx.sentiment?;
        if sentiment.score.abs() < self.min_abs_score {
            return None;
        }
        let direction = match sentiment.classification {
            DirectionalSignal::Bullish => Direction::Long,
            DirectionalSignal::Bearish => Direction::Short,
            DirectionalSignal::Neutral => return None,
        };

        let confidence = confidence_from_strength(sentiment.score.abs(), self.min_abs_score, 1.0, 6.0, 8.5);
        build_vote(
            &self.name,
            BotCategory::Sentiment,
            direction,
            confidence,
            ctx.features.price,
            ctx.features.atr,
            1,
            self.max_leverage,
            format!("Sentiment score {:.2} ({})", sentiment.score, sentiment.classification),
        )
    }
}

/// Synthesizes a heuristic multi-indicator composite "AI context" reading —
/// an equal-weighted blend of normalized oscillator/momentum signals,
/// mirroring the `futures_intel::update_composite` equal-weighted pattern
/// rather than calling an external model (wire format is out of scope).
pub struct AiContext {
    pub name: String,
    pub threshold: f64,
    pub max_leverage: u8,
}

impl Bot for AiContext {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> BotCategory {
        BotCategory::Ai
    }
    fn analyze(&self, ctx: &BotContext) -> Option<BotVote> {
        let mut signals = Vec::new();
        if let Some(rsi) = ctx.features.rsi {
            signals.push(((rsi - 50.0) / 50.0).clamp(-1.0, 1.0));
        }
        if let Some(macd) = ctx.features.macd {
            signals.push(macd.hist.signum() * macd.hist.abs().min(1.0));
        }
        if let Some(stoch) = ctx.features.stoch {
            signals.push(((stoch.k - 50.0) / 50.0).clamp(-1.0, 1.0));
        }
        signals.push(match ctx.features.regime.label {
            crate::types::RegimeLabel::Bull => 0.5,
            crate::types::RegimeLabel::Bear => -0.5,
            _ => 0.0,
        });

        if signals.is_empty() {
            return None;
        }
        let composite = signals.iter().sum::<f64>() / signals.len() as f64;

        let direction = if composite > self.threshold {
            Direction::Long
        } else if composite < -self.threshold {
            Direction::Short
        } else {
            return None;
        };

        let confidence = confidence_from_strength(composite.abs(), self.threshold, 0.8, 6.0, 8.5);
        build_vote(
            &self.name,
            BotCategory::Ai,
            direction,
            confidence,
            ctx.features.price,
            ctx.features.atr,
            1,
            self.max_leverage,
            format!("Composite AI-context signal {composite:.2}"),
        )
    }
}

/// Requires confluence across trend (ADX/EMA), momentum (MACD), and
/// volatility (band width) before voting — higher-conviction, lower
/// frequency than the single-indicator shapes.
pub struct CompositeConfluence {
    pub name: String,
    pub adx_min: f64,
    pub max_leverage: u8,
}

impl Bot for CompositeConfluence {
    fn name(&self) -> &str {
        &self.name
    }
    fn category(&self) -> BotCategory {
        BotCategory::Specialized
    }
    fn analyze(&self, ctx: &BotContext) -> Option<BotVote> {
        let ema = ctx.features.ema?;
        let macd = ctx.features.macd?;
        let adx = ctx.features.adx?;
        let bb = ctx.features.bollinger?;

        if adx < self.adx_min {
            return None;
        }

        let trend_long = ema.ema20 > ema.ema50 && ema.ema50 > ema.ema200;
        let trend_short = ema.ema20 < ema.ema50 && ema.ema50 < ema.ema200;
        let momentum_long = macd.hist > 0.0;
        let momentum_short = macd.hist < 0.0;

        let direction = if trend_long && momentum_long {
            Direction::Long
        } else if trend_short && momentum_short {
            Direction::Short
        } else {
            return None;
        };

        let confidence = confidence_from_strength(adx + bb.width, self.adx_min, self.adx_min + 40.0, 7.0, 9.8);
        build_vote(
            &self.name,
            BotCategory::Specialized,
            direction,
            confidence,
            ctx.features.price,
            ctx.features.atr,
            3,
            self.max_leverage,
            "Trend and momentum confluence".to_string(),
        )
    }
}
