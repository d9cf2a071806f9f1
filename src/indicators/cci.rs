// =============================================================================
// Commodity Channel Index (CCI)
// =============================================================================
//
// typical_price_t = (H + L + C) / 3
// CCI = (typical_price - SMA(typical_price, period)) / (0.015 * mean_deviation)
//
// Default period: 20

use crate::types::Candle;

/// Compute the current CCI value from a slice of OHLCV candles.
///
/// Returns `None` on insufficient data or a degenerate (zero mean-deviation)
/// window.
pub fn calculate_cci(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period {
        return None;
    }

    let typical: Vec<f64> = candles.iter().map(|c| (c.h + c.l + c.c) / 3.0).collect();
    let window = &typical[typical.len() - period..];
    let sma: f64 = window.iter().sum::<f64>() / period as f64;
    let mean_dev: f64 = window.iter().map(|tp| (tp - sma).abs()).sum::<f64>() / period as f64;

    if mean_dev == 0.0 {
        return None;
    }

    let cci = (typical.last()? - sma) / (0.015 * mean_dev);
    if cci.is_finite() {
        Some(cci)
    } else {
        None
    }
}

/// Convenience function using the standard 20-period configuration.
pub fn calculate(candles: &[Candle]) -> Option<f64> {
    calculate_cci(candles, 20)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(h: f64, l: f64, c: f64) -> Candle {
        Candle { t: 0, o: c, h, l, c, v: 1.0 }
    }

    #[test]
    fn cci_insufficient_data() {
        let candles = vec![candle(101.0, 99.0, 100.0); 5];
        assert!(calculate(&candles).is_none());
    }

    #[test]
    fn cci_flat_series_is_none() {
        // Zero mean deviation => undefined CCI.
        let candles = vec![candle(100.0, 100.0, 100.0); 20];
        assert!(calculate(&candles).is_none());
    }

    #[test]
    fn cci_spike_above_zero() {
        let mut candles = vec![candle(101.0, 99.0, 100.0); 19];
        candles.push(candle(120.0, 118.0, 119.0));
        let cci = calculate_cci(&candles, 20).unwrap();
        assert!(cci > 0.0, "expected positive CCI on upward spike, got {cci}");
    }
}
