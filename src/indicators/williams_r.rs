// =============================================================================
// Williams %R
// =============================================================================
//
// %R = (highest_high(period) - close) / (highest_high(period) - lowest_low(period)) * -100
//
// Range: [-100, 0]. Readings above -20 are overbought, below -80 oversold.
// Default period: 14

use crate::types::Candle;

/// Compute the current Williams %R value.
///
/// Returns `None` on insufficient data or a degenerate (zero-range) window.
pub fn calculate_williams_r(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period {
        return None;
    }

    let window = &candles[candles.len() - period..];
    let highest = window.iter().map(|c| c.h).fold(f64::MIN, f64::max);
    let lowest = window.iter().map(|c| c.l).fold(f64::MAX, f64::min);
    let range = highest - lowest;
    if range == 0.0 {
        return None;
    }

    let close = candles.last()?.c;
    let r = (highest - close) / range * -100.0;
    if r.is_finite() {
        Some(r)
    } else {
        None
    }
}

/// Convenience function using the standard 14-period configuration.
pub fn calculate(candles: &[Candle]) -> Option<f64> {
    calculate_williams_r(candles, 14)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(h: f64, l: f64, c: f64) -> Candle {
        Candle { t: 0, o: c, h, l, c, v: 1.0 }
    }

    #[test]
    fn williams_r_insufficient_data() {
        let candles = vec![candle(101.0, 99.0, 100.0); 5];
        assert!(calculate(&candles).is_none());
    }

    #[test]
    fn williams_r_range() {
        let candles: Vec<Candle> = (0..20)
            .map(|i| candle(100.0 + i as f64, 90.0, 95.0 + i as f64 * 0.3))
            .collect();
        let r = calculate(&candles).unwrap();
        assert!((-100.0..=0.0).contains(&r), "%R {r} out of range");
    }

    #[test]
    fn williams_r_at_high_is_near_zero() {
        let mut candles = vec![candle(101.0, 99.0, 100.0); 13];
        candles.push(candle(110.0, 99.0, 110.0));
        let r = calculate(&candles).unwrap();
        assert!(r > -5.0, "closing at the high should give %R near 0, got {r}");
    }

    #[test]
    fn williams_r_flat_is_none() {
        let candles = vec![candle(100.0, 100.0, 100.0); 14];
        assert!(calculate(&candles).is_none());
    }
}
