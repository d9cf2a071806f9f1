// =============================================================================
// Volume Weighted Average Price (VWAP)
// =============================================================================
//
// VWAP = sum(typical_price_i * volume_i) / sum(volume_i)
//
// Computed over the full candle slice handed in by the caller (typically one
// session's worth of bars); callers decide the window.

use crate::types::Candle;

/// Compute VWAP over the given candle slice.
///
/// Returns `None` when the slice is empty or total volume is zero.
pub fn calculate_vwap(candles: &[Candle]) -> Option<f64> {
    if candles.is_empty() {
        return None;
    }

    let mut pv_sum = 0.0;
    let mut v_sum = 0.0;
    for c in candles {
        let typical = (c.h + c.l + c.c) / 3.0;
        pv_sum += typical * c.v;
        v_sum += c.v;
    }

    if v_sum == 0.0 {
        return None;
    }

    let vwap = pv_sum / v_sum;
    if vwap.is_finite() {
        Some(vwap)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(h: f64, l: f64, c: f64, v: f64) -> Candle {
        Candle { t: 0, o: c, h, l, c, v }
    }

    #[test]
    fn vwap_empty_is_none() {
        assert!(calculate_vwap(&[]).is_none());
    }

    #[test]
    fn vwap_zero_volume_is_none() {
        let candles = vec![candle(101.0, 99.0, 100.0, 0.0); 5];
        assert!(calculate_vwap(&candles).is_none());
    }

    #[test]
    fn vwap_equal_volume_matches_average_typical_price() {
        let candles = vec![
            candle(102.0, 98.0, 100.0, 10.0),
            candle(104.0, 100.0, 102.0, 10.0),
        ];
        let vwap = calculate_vwap(&candles).unwrap();
        let expected = ((100.0 + 100.0 + 100.0) / 3.0 + (104.0 + 100.0 + 102.0) / 3.0) / 2.0;
        assert!((vwap - expected).abs() < 1e-9);
    }

    #[test]
    fn vwap_weights_toward_high_volume_bar() {
        let candles = vec![
            candle(101.0, 99.0, 100.0, 1.0),
            candle(201.0, 199.0, 200.0, 1000.0),
        ];
        let vwap = calculate_vwap(&candles).unwrap();
        assert!(vwap > 190.0, "VWAP should be dominated by the high-volume bar, got {vwap}");
    }
}
