// =============================================================================
// Ichimoku Kinko Hyo (cloud components)
// =============================================================================
//
// Tenkan-sen (conversion line)  = (highest_high(9)  + lowest_low(9))  / 2
// Kijun-sen  (base line)        = (highest_high(26) + lowest_low(26)) / 2
// Senkou Span A (leading span A)= (Tenkan + Kijun) / 2
// Senkou Span B (leading span B)= (highest_high(52) + lowest_low(52)) / 2
//
// The leading spans are plotted 26 periods ahead on a chart; this module
// returns their *current* computed values, leaving any forward-shift to the
// caller.

use crate::types::{Candle, IchimokuValue};

fn high_low(candles: &[Candle], period: usize) -> Option<(f64, f64)> {
    if period == 0 || candles.len() < period {
        return None;
    }
    let window = &candles[candles.len() - period..];
    let high = window.iter().map(|c| c.h).fold(f64::MIN, f64::max);
    let low = window.iter().map(|c| c.l).fold(f64::MAX, f64::min);
    Some((high, low))
}

/// Compute the current Ichimoku cloud components using the standard
/// 9/26/52 period configuration.
///
/// Returns `None` when there is insufficient history for the 52-period
/// Senkou Span B calculation.
pub fn calculate_ichimoku(candles: &[Candle]) -> Option<IchimokuValue> {
    let (tenkan_high, tenkan_low) = high_low(candles, 9)?;
    let (kijun_high, kijun_low) = high_low(candles, 26)?;
    let (span_b_high, span_b_low) = high_low(candles, 52)?;

    let tenkan = (tenkan_high + tenkan_low) / 2.0;
    let kijun = (kijun_high + kijun_low) / 2.0;
    let senkou_a = (tenkan + kijun) / 2.0;
    let senkou_b = (span_b_high + span_b_low) / 2.0;

    if [tenkan, kijun, senkou_a, senkou_b].iter().all(|v| v.is_finite()) {
        Some(IchimokuValue { tenkan, kijun, senkou_a, senkou_b })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(h: f64, l: f64, c: f64) -> Candle {
        Candle { t: 0, o: c, h, l, c, v: 1.0 }
    }

    #[test]
    fn ichimoku_insufficient_data() {
        let candles = vec![candle(101.0, 99.0, 100.0); 30];
        assert!(calculate_ichimoku(&candles).is_none());
    }

    #[test]
    fn ichimoku_uptrend_places_cloud_below_price() {
        let candles: Vec<Candle> = (0..60)
            .map(|i| {
                let base = 100.0 + i as f64;
                candle(base + 1.0, base - 1.0, base)
            })
            .collect();
        let v = calculate_ichimoku(&candles).unwrap();
        assert!(v.tenkan > v.kijun, "tenkan should lead kijun in a steady uptrend");
        assert!(v.senkou_a > v.senkou_b, "leading span A should sit above B in an uptrend");
    }

    #[test]
    fn ichimoku_flat_market_lines_converge() {
        let candles = vec![candle(101.0, 99.0, 100.0); 60];
        let v = calculate_ichimoku(&candles).unwrap();
        assert!((v.tenkan - v.kijun).abs() < 1e-9);
        assert!((v.senkou_a - v.senkou_b).abs() < 1e-9);
    }
}
