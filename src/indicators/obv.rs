// =============================================================================
// On-Balance Volume (OBV)
// =============================================================================
//
// OBV_0 = 0
// OBV_t = OBV_{t-1} + volume_t   if close_t > close_{t-1}
//       = OBV_{t-1} - volume_t   if close_t < close_{t-1}
//       = OBV_{t-1}              if close_t == close_{t-1}
//
// The raw cumulative OBV level is not comparable across symbols; callers care
// about its recent *trend* rather than its absolute value.

use crate::types::{Candle, ObvTrend};

/// Compute the full OBV series for a candle slice.
pub fn calculate_obv(candles: &[Candle]) -> Vec<f64> {
    if candles.is_empty() {
        return Vec::new();
    }

    let mut obv = Vec::with_capacity(candles.len());
    obv.push(0.0);
    for i in 1..candles.len() {
        let prev = obv[i - 1];
        let next = if candles[i].c > candles[i - 1].c {
            prev + candles[i].v
        } else if candles[i].c < candles[i - 1].c {
            prev - candles[i].v
        } else {
            prev
        };
        obv.push(next);
    }
    obv
}

/// Classify the short-term OBV trend by comparing the latest value against
/// its `lookback`-period average.
///
/// Returns `None` on insufficient data.
pub fn obv_trend(candles: &[Candle], lookback: usize) -> Option<ObvTrend> {
    if lookback == 0 || candles.len() < lookback + 1 {
        return None;
    }

    let obv = calculate_obv(candles);
    let window = &obv[obv.len() - lookback..];
    let avg: f64 = window.iter().sum::<f64>() / lookback as f64;
    let latest = *obv.last()?;

    let spread = window.iter().fold(0.0_f64, |acc, v| acc.max((v - avg).abs())).max(1e-9);
    let threshold = spread * 0.1;

    if latest - avg > threshold {
        Some(ObvTrend::Rising)
    } else if avg - latest > threshold {
        Some(ObvTrend::Falling)
    } else {
        Some(ObvTrend::Flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(c: f64, v: f64) -> Candle {
        Candle { t: 0, o: c, h: c, l: c, c, v }
    }

    #[test]
    fn obv_starts_at_zero() {
        let candles = vec![candle(100.0, 10.0)];
        let obv = calculate_obv(&candles);
        assert_eq!(obv, vec![0.0]);
    }

    #[test]
    fn obv_accumulates_on_up_moves() {
        let candles = vec![candle(100.0, 10.0), candle(105.0, 20.0), candle(110.0, 5.0)];
        let obv = calculate_obv(&candles);
        assert_eq!(obv, vec![0.0, 20.0, 25.0]);
    }

    #[test]
    fn obv_decreases_on_down_moves() {
        let candles = vec![candle(100.0, 10.0), candle(95.0, 20.0)];
        let obv = calculate_obv(&candles);
        assert_eq!(obv, vec![0.0, -20.0]);
    }

    #[test]
    fn obv_trend_rising() {
        let candles: Vec<Candle> = (0..20).map(|i| candle(100.0 + i as f64, 10.0)).collect();
        let trend = obv_trend(&candles, 10);
        assert_eq!(trend, Some(ObvTrend::Rising));
    }

    #[test]
    fn obv_trend_insufficient_data() {
        let candles = vec![candle(100.0, 10.0); 3];
        assert!(obv_trend(&candles, 10).is_none());
    }
}
