// =============================================================================
// Parabolic SAR (Stop and Reverse)
// =============================================================================
//
// Wilder's trailing-stop indicator. Starting in an assumed uptrend:
//   SAR_t = SAR_{t-1} + AF * (EP - SAR_{t-1})
// where EP (extreme point) is the highest high seen since the last reversal
// and AF (acceleration factor) starts at `af_start`, increases by
// `af_step` each time a new EP is set, capped at `af_max`.
//
// A reversal occurs when price crosses the current SAR; AF resets to
// `af_start` and EP resets to the opposite extreme.
//
// Default: af_start=0.02, af_step=0.02, af_max=0.2

use crate::types::Candle;

/// Compute the current Parabolic SAR value by replaying the full candle
/// history from a naive initial trend assumption.
///
/// Returns `None` when fewer than two candles are supplied.
pub fn calculate_parabolic_sar(
    candles: &[Candle],
    af_start: f64,
    af_step: f64,
    af_max: f64,
) -> Option<f64> {
    if candles.len() < 2 {
        return None;
    }

    // Seed: assume an uptrend starting from the first candle's low.
    let mut rising = candles[1].c >= candles[0].c;
    let mut sar = if rising { candles[0].l } else { candles[0].h };
    let mut ep = if rising { candles[0].h } else { candles[0].l };
    let mut af = af_start;

    for i in 1..candles.len() {
        let candle = &candles[i];
        let mut next_sar = sar + af * (ep - sar);

        if rising {
            // SAR may never move above the prior two lows.
            let prior_low = candles[i.saturating_sub(2)..i].iter().map(|c| c.l).fold(f64::MAX, f64::min);
            next_sar = next_sar.min(prior_low);

            if candle.l < next_sar {
                // Reversal to falling.
                rising = false;
                next_sar = ep;
                ep = candle.l;
                af = af_start;
            } else if candle.h > ep {
                ep = candle.h;
                af = (af + af_step).min(af_max);
            }
        } else {
            let prior_high = candles[i.saturating_sub(2)..i].iter().map(|c| c.h).fold(f64::MIN, f64::max);
            next_sar = next_sar.max(prior_high);

            if candle.h > next_sar {
                // Reversal to rising.
                rising = true;
                next_sar = ep;
                ep = candle.h;
                af = af_start;
            } else if candle.l < ep {
                ep = candle.l;
                af = (af + af_step).min(af_max);
            }
        }

        sar = next_sar;
        if !sar.is_finite() {
            return None;
        }
    }

    Some(sar)
}

/// Convenience function using the standard 0.02/0.02/0.2 configuration.
pub fn calculate(candles: &[Candle]) -> Option<f64> {
    calculate_parabolic_sar(candles, 0.02, 0.02, 0.2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(h: f64, l: f64, c: f64) -> Candle {
        Candle { t: 0, o: c, h, l, c, v: 1.0 }
    }

    #[test]
    fn sar_insufficient_data() {
        let candles = vec![candle(101.0, 99.0, 100.0)];
        assert!(calculate(&candles).is_none());
    }

    #[test]
    fn sar_uptrend_stays_below_price() {
        let candles: Vec<Candle> = (0..30)
            .map(|i| {
                let base = 100.0 + i as f64 * 2.0;
                candle(base + 1.0, base - 1.0, base + 0.5)
            })
            .collect();
        let sar = calculate(&candles).unwrap();
        let last_low = candles.last().unwrap().l;
        assert!(sar < last_low, "SAR should trail below price in an uptrend, got {sar} vs low {last_low}");
    }

    #[test]
    fn sar_downtrend_stays_above_price() {
        let candles: Vec<Candle> = (0..30)
            .map(|i| {
                let base = 200.0 - i as f64 * 2.0;
                candle(base + 1.0, base - 1.0, base - 0.5)
            })
            .collect();
        let sar = calculate(&candles).unwrap();
        let last_high = candles.last().unwrap().h;
        assert!(sar > last_high, "SAR should trail above price in a downtrend, got {sar} vs high {last_high}");
    }
}
