// =============================================================================
// Market Regime Classification
// =============================================================================
//
// Classifies a (coin, timeframe) pair into one of four regimes from 30-day
// momentum, ADX trend strength, and ATR-normalized volatility:
//
//   ADX > 30 AND slope(close, 30) > 0  => BULL
//   ADX > 30 AND slope(close, 30) < 0  => BEAR
//   ATR / price > 0.04                 => VOLATILE
//   otherwise                          => SIDEWAYS
//
// Confidence reflects how far the winning rule's inputs sit past its
// threshold, clamped to [0.0, 1.0]. VOLATILE is checked after the
// directional rules so a volatile trending market still reports as
// BULL/BEAR — matching the priority order above.

use crate::indicators::adx::calculate_adx;
use crate::indicators::atr::calculate_atr;
use crate::types::{Candle, Regime, RegimeLabel};

const ADX_TREND_THRESHOLD: f64 = 30.0;
const ATR_PCT_VOLATILE_THRESHOLD: f64 = 0.04;
const SLOPE_WINDOW: usize = 30;

/// Ordinary-least-squares slope of the last `window` closes against an
/// index axis `0..window`. Positive => uptrend, negative => downtrend.
///
/// Returns `None` when fewer than `window` closes are available.
pub fn slope(closes: &[f64], window: usize) -> Option<f64> {
    if window < 2 || closes.len() < window {
        return None;
    }
    let series = &closes[closes.len() - window..];
    let n = window as f64;
    let xs: Vec<f64> = (0..window).map(|i| i as f64).collect();
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = series.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for (x, y) in xs.iter().zip(series.iter()) {
        num += (x - x_mean) * (y - y_mean);
        den += (x - x_mean).powi(2);
    }

    if den == 0.0 {
        return None;
    }
    let m = num / den;
    if m.is_finite() {
        Some(m)
    } else {
        None
    }
}

/// Classify a regime from the raw indicator readings.
///
/// `adx` is the 14-period ADX, `slope_value` the OLS slope of the last 30
/// closes, `atr_pct` the ATR as a fraction of the current price (0.04 == 4%).
pub fn classify(adx: f64, slope_value: f64, atr_pct: f64) -> (RegimeLabel, f64) {
    if adx > ADX_TREND_THRESHOLD && slope_value > 0.0 {
        let confidence = trend_confidence(adx, slope_value);
        return (RegimeLabel::Bull, confidence);
    }
    if adx > ADX_TREND_THRESHOLD && slope_value < 0.0 {
        let confidence = trend_confidence(adx, -slope_value);
        return (RegimeLabel::Bear, confidence);
    }
    if atr_pct > ATR_PCT_VOLATILE_THRESHOLD {
        let confidence = remap(atr_pct, ATR_PCT_VOLATILE_THRESHOLD, 0.12, 0.55, 1.0);
        return (RegimeLabel::Volatile, confidence);
    }
    // Sideways confidence grows as ADX falls further below the trend
    // threshold — a weak ADX is stronger evidence of range-bound action.
    let confidence = remap(adx, ADX_TREND_THRESHOLD, 5.0, 0.30, 0.80);
    (RegimeLabel::Sideways, confidence)
}

fn trend_confidence(adx: f64, directional_slope_abs: f64) -> f64 {
    let adx_conf = remap(adx, ADX_TREND_THRESHOLD, 60.0, 0.55, 1.0);
    let slope_conf = remap(directional_slope_abs.abs(), 0.0, directional_slope_abs.abs().max(1e-9) * 4.0, 0.55, 1.0);
    ((adx_conf + slope_conf) / 2.0).clamp(0.0, 1.0)
}

/// Linearly remap `value` from `[in_lo, in_hi]` to `[out_lo, out_hi]`, clamped
/// to the output range. Works regardless of whether `in_lo < in_hi` or vice
/// versa.
fn remap(value: f64, in_lo: f64, in_hi: f64, out_lo: f64, out_hi: f64) -> f64 {
    let t = if (in_hi - in_lo).abs() < f64::EPSILON {
        0.5
    } else {
        (value - in_lo) / (in_hi - in_lo)
    };
    let clamped = t.clamp(0.0, 1.0);
    out_lo + clamped * (out_hi - out_lo)
}

/// Run full regime classification on an OHLCV candle slice (oldest first).
///
/// Returns `None` when there is not enough history to compute ADX, the
/// 30-period slope, or ATR.
pub fn detect_regime(candles: &[Candle]) -> Option<Regime> {
    let closes: Vec<f64> = candles.iter().map(|c| c.c).collect();
    let adx = calculate_adx(candles, 14)?;
    let slope_value = slope(&closes, SLOPE_WINDOW)?;
    let atr = calculate_atr(candles, 14)?;
    let price = candles.last()?.c;
    if price == 0.0 {
        return None;
    }
    let atr_pct = atr / price;

    let (label, confidence) = classify(adx, slope_value, atr_pct);
    Some(Regime { label, confidence })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(c: f64) -> Candle {
        Candle { t: 0, o: c, h: c + 1.0, l: c - 1.0, c, v: 100.0 }
    }

    #[test]
    fn slope_detects_uptrend() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let s = slope(&closes, 30).unwrap();
        assert!(s > 0.0);
    }

    #[test]
    fn slope_detects_downtrend() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let s = slope(&closes, 30).unwrap();
        assert!(s < 0.0);
    }

    #[test]
    fn slope_insufficient_data() {
        let closes = vec![1.0, 2.0, 3.0];
        assert!(slope(&closes, 30).is_none());
    }

    #[test]
    fn classify_bull_on_strong_uptrend() {
        let (label, confidence) = classify(40.0, 2.0, 0.01);
        assert_eq!(label, RegimeLabel::Bull);
        assert!(confidence > 0.0 && confidence <= 1.0);
    }

    #[test]
    fn classify_bear_on_strong_downtrend() {
        let (label, _) = classify(40.0, -2.0, 0.01);
        assert_eq!(label, RegimeLabel::Bear);
    }

    #[test]
    fn classify_volatile_overrides_weak_trend() {
        let (label, _) = classify(20.0, 0.5, 0.08);
        assert_eq!(label, RegimeLabel::Volatile);
    }

    #[test]
    fn classify_sideways_default() {
        let (label, confidence) = classify(15.0, 0.1, 0.01);
        assert_eq!(label, RegimeLabel::Sideways);
        assert!(confidence > 0.0);
    }

    #[test]
    fn classify_trend_priority_over_volatile() {
        // Strong trend AND high ATR% — directional rule wins per priority order.
        let (label, _) = classify(45.0, 3.0, 0.08);
        assert_eq!(label, RegimeLabel::Bull);
    }

    #[test]
    fn remap_clamps_both_directions() {
        assert!((remap(0.5, 0.0, 1.0, 0.0, 10.0) - 5.0).abs() < 1e-10);
        assert!((remap(2.0, 0.0, 1.0, 0.0, 10.0) - 10.0).abs() < 1e-10);
        assert!((remap(-1.0, 0.0, 1.0, 0.0, 10.0) - 0.0).abs() < 1e-10);
    }

    #[test]
    fn detect_regime_insufficient_history_is_none() {
        let candles = vec![candle(100.0); 5];
        assert!(detect_regime(&candles).is_none());
    }

    #[test]
    fn detect_regime_on_strong_uptrend_series() {
        let candles: Vec<Candle> = (0..60).map(|i| candle(100.0 + i as f64 * 2.0)).collect();
        let regime = detect_regime(&candles);
        assert!(regime.is_some());
        assert_eq!(regime.unwrap().label, RegimeLabel::Bull);
    }
}
