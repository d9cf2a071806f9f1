// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// SMA_t = mean(closes[t - period + 1 ..= t])

/// Calculate the Simple Moving Average for the given closing prices and
/// period. Returns the full series, one value per window of `period` closes.
pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(closes.len() - period + 1);
    let mut window_sum: f64 = closes[..period].iter().sum();
    result.push(window_sum / period as f64);

    for i in period..closes.len() {
        window_sum += closes[i] - closes[i - period];
        result.push(window_sum / period as f64);
    }
    result
}

/// Return the most recent SMA value, or `None` on insufficient data.
pub fn current_sma(closes: &[f64], period: usize) -> Option<f64> {
    calculate_sma(closes, period).last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_basic() {
        let closes = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let sma = calculate_sma(&closes, 3);
        assert_eq!(sma, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn sma_insufficient_data() {
        let closes = vec![1.0, 2.0];
        assert!(calculate_sma(&closes, 3).is_empty());
    }

    #[test]
    fn sma_period_zero() {
        let closes = vec![1.0, 2.0, 3.0];
        assert!(calculate_sma(&closes, 0).is_empty());
    }

    #[test]
    fn sma_current() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let sma = current_sma(&closes, 20);
        assert!(sma.is_some());
        assert!((sma.unwrap() - 10.5).abs() < 1e-10);
    }
}
