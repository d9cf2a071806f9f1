// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
// MACD line   = EMA(fast) - EMA(slow)
// Signal line = EMA(signal_period) of the MACD line
// Histogram   = MACD line - Signal line
//
// Default periods: fast=12, slow=26, signal=9

use crate::indicators::ema::calculate_ema;
use crate::types::MacdValue;

/// Calculate the current MACD line/signal/histogram from a closes series.
///
/// Returns `None` when there is not enough history to seed both the slow EMA
/// and the signal-period EMA of the MACD line.
pub fn calculate_macd(
    closes: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> Option<MacdValue> {
    if fast_period == 0 || slow_period == 0 || signal_period == 0 || fast_period >= slow_period {
        return None;
    }
    if closes.len() < slow_period + signal_period {
        return None;
    }

    let fast_ema = calculate_ema(closes, fast_period);
    let slow_ema = calculate_ema(closes, slow_period);
    if fast_ema.is_empty() || slow_ema.is_empty() {
        return None;
    }

    // EMA series are aligned to the tail of `closes`; fast_ema is longer than
    // slow_ema by (slow_period - fast_period), so offset fast to match.
    let offset = fast_ema.len() - slow_ema.len();
    let macd_line: Vec<f64> = slow_ema
        .iter()
        .enumerate()
        .map(|(i, &slow)| fast_ema[i + offset] - slow)
        .collect();

    if macd_line.len() < signal_period {
        return None;
    }

    let signal_series = calculate_ema(&macd_line, signal_period);
    let signal = *signal_series.last()?;
    let line = *macd_line.last()?;
    let hist = line - signal;

    if line.is_finite() && signal.is_finite() && hist.is_finite() {
        Some(MacdValue { line, signal, hist })
    } else {
        None
    }
}

/// Convenience function using the standard 12/26/9 configuration.
pub fn calculate(closes: &[f64]) -> Option<MacdValue> {
    calculate_macd(closes, 12, 26, 9)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macd_insufficient_data() {
        let closes = vec![1.0; 10];
        assert!(calculate(&closes).is_none());
    }

    #[test]
    fn macd_trending_series_positive_histogram() {
        let closes: Vec<f64> = (0..100).map(|i| 100.0 + i as f64 * 0.5).collect();
        let macd = calculate(&closes);
        assert!(macd.is_some());
        let v = macd.unwrap();
        assert!(v.line > 0.0, "uptrend should give positive MACD line");
        assert!(v.hist.is_finite());
    }

    #[test]
    fn macd_flat_series_near_zero() {
        let closes = vec![100.0; 100];
        let macd = calculate(&closes).unwrap();
        assert!(macd.line.abs() < 1e-6);
        assert!(macd.hist.abs() < 1e-6);
    }

    #[test]
    fn macd_invalid_periods_rejected() {
        let closes: Vec<f64> = (0..100).map(|i| i as f64).collect();
        assert!(calculate_macd(&closes, 26, 12, 9).is_none());
        assert!(calculate_macd(&closes, 0, 26, 9).is_none());
    }
}
