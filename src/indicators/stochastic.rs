// =============================================================================
// Stochastic Oscillator
// =============================================================================
//
// %K = (close - lowest_low(period)) / (highest_high(period) - lowest_low(period)) * 100
// %D = SMA(%K, smooth_period)
//
// Default: period=14, smooth_period=3

use crate::indicators::sma::calculate_sma;
use crate::types::{Candle, StochValue};

/// Compute the current %K/%D stochastic reading.
///
/// Returns `None` on insufficient data or a degenerate (zero-range) window.
pub fn calculate_stochastic(
    candles: &[Candle],
    period: usize,
    smooth_period: usize,
) -> Option<StochValue> {
    if period == 0 || smooth_period == 0 || candles.len() < period + smooth_period {
        return None;
    }

    let mut k_values = Vec::with_capacity(candles.len() - period + 1);
    for i in period - 1..candles.len() {
        let window = &candles[i + 1 - period..=i];
        let highest = window.iter().map(|c| c.h).fold(f64::MIN, f64::max);
        let lowest = window.iter().map(|c| c.l).fold(f64::MAX, f64::min);
        let range = highest - lowest;
        if range == 0.0 {
            k_values.push(50.0);
            continue;
        }
        let k = (candles[i].c - lowest) / range * 100.0;
        if !k.is_finite() {
            return None;
        }
        k_values.push(k);
    }

    if k_values.len() < smooth_period {
        return None;
    }

    let d_series = calculate_sma(&k_values, smooth_period);
    let d = *d_series.last()?;
    let k = *k_values.last()?;

    Some(StochValue { k, d })
}

/// Convenience function using the standard 14/3 configuration.
pub fn calculate(candles: &[Candle]) -> Option<StochValue> {
    calculate_stochastic(candles, 14, 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(h: f64, l: f64, c: f64) -> Candle {
        Candle { t: 0, o: c, h, l, c, v: 1.0 }
    }

    #[test]
    fn stochastic_insufficient_data() {
        let candles = vec![candle(101.0, 99.0, 100.0); 5];
        assert!(calculate(&candles).is_none());
    }

    #[test]
    fn stochastic_at_high_near_100() {
        let mut candles: Vec<Candle> = (0..20).map(|i| candle(100.0 + i as f64, 90.0, 95.0 + i as f64 * 0.5)).collect();
        candles.push(candle(130.0, 90.0, 130.0));
        let v = calculate_stochastic(&candles, 14, 3).unwrap();
        assert!(v.k > 90.0, "expected %K near 100 at the high, got {}", v.k);
        assert!((0.0..=100.0).contains(&v.d));
    }

    #[test]
    fn stochastic_flat_range_defaults_to_midpoint() {
        let candles = vec![candle(100.0, 100.0, 100.0); 20];
        let v = calculate(&candles).unwrap();
        assert!((v.k - 50.0).abs() < 1e-9);
        assert!((v.d - 50.0).abs() < 1e-9);
    }
}
