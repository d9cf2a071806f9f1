// =============================================================================
// Feature Vector Assembly
// =============================================================================
//
// Wires the individual indicator functions together into a single
// `FeatureVector` for one (coin, timeframe) pair. Every field stays `None`
// when its underlying indicator has insufficient history — this module never
// fabricates a zero to fill a gap.

use crate::indicators::{
    adx, atr, bollinger, cci, ema, ichimoku, macd, obv, parabolic_sar, rsi, sma, stochastic, vwap,
    williams_r,
};
use crate::types::{BollingerValue, Candle, EmaValue, FeatureVector, OhlcvSeries, Regime};

/// Build a `FeatureVector` for the given OHLCV series and already-classified
/// regime. `candles` must be ordered oldest-first, matching every indicator
/// function in this module.
pub fn build_feature_vector(series: &OhlcvSeries, regime: Regime) -> FeatureVector {
    let closes = series.closes();
    let candles: &[Candle] = &series.candles;

    let price = candles.last().map(|c| c.c).unwrap_or(0.0);

    let rsi_value = rsi::calculate_rsi(&closes, 14).last().copied();

    let macd_value = macd::calculate(&closes);

    let bollinger_value = bollinger::calculate_bollinger(&closes, 20, 2.0).map(|b| BollingerValue {
        upper: b.upper,
        mid: b.middle,
        lower: b.lower,
        width: b.width,
    });

    let ema_value = {
        let e20 = ema::calculate_ema(&closes, 20);
        let e50 = ema::calculate_ema(&closes, 50);
        let e200 = ema::calculate_ema(&closes, 200);
        match (e20.last(), e50.last(), e200.last()) {
            (Some(&ema20), Some(&ema50), Some(&ema200)) => {
                Some(EmaValue { ema20, ema50, ema200 })
            }
            _ => None,
        }
    };

    let sma20 = sma::current_sma(&closes, 20);
    let atr_value = atr::calculate_atr(candles, 14);
    let adx_value = adx::calculate_adx(candles, 14);
    let stoch_value = stochastic::calculate(candles);
    let cci_value = cci::calculate(candles);
    let williams_r_value = williams_r::calculate(candles);
    let vwap_value = vwap::calculate_vwap(candles);
    let obv_trend_value = obv::obv_trend(candles, 20);
    let ichimoku_value = ichimoku::calculate_ichimoku(candles);
    let parabolic_sar_value = parabolic_sar::calculate(candles);

    FeatureVector {
        symbol: series.symbol.clone(),
        timeframe: series.timeframe,
        price,
        rsi: rsi_value,
        macd: macd_value,
        bollinger: bollinger_value,
        ema: ema_value,
        sma20,
        atr: atr_value,
        adx: adx_value,
        stoch: stoch_value,
        cci: cci_value,
        williams_r: williams_r_value,
        vwap: vwap_value,
        obv_trend: obv_trend_value,
        ichimoku: ichimoku_value,
        parabolic_sar: parabolic_sar_value,
        regime,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RegimeLabel, Timeframe};

    fn sample_series(len: usize) -> OhlcvSeries {
        let candles: Vec<Candle> = (0..len)
            .map(|i| {
                let base = 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.1;
                Candle {
                    t: i as i64 * 3_600_000,
                    o: base,
                    h: base + 1.0,
                    l: base - 1.0,
                    c: base + 0.2,
                    v: 1_000.0 + i as f64,
                }
            })
            .collect();
        OhlcvSeries {
            symbol: "BTC".to_string(),
            timeframe: Timeframe::OneHour,
            candles,
        }
    }

    #[test]
    fn sparse_history_leaves_fields_none() {
        let series = sample_series(5);
        let regime = Regime { label: RegimeLabel::Sideways, confidence: 0.3 };
        let fv = build_feature_vector(&series, regime);
        assert!(fv.rsi.is_none());
        assert!(fv.macd.is_none());
        assert!(fv.ichimoku.is_none());
        assert_eq!(fv.symbol, "BTC");
    }

    #[test]
    fn rich_history_populates_most_fields() {
        let series = sample_series(260);
        let regime = Regime { label: RegimeLabel::Bull, confidence: 0.7 };
        let fv = build_feature_vector(&series, regime);
        assert!(fv.rsi.is_some());
        assert!(fv.macd.is_some());
        assert!(fv.bollinger.is_some());
        assert!(fv.ema.is_some());
        assert!(fv.atr.is_some());
        assert!(fv.adx.is_some());
        assert!(fv.ichimoku.is_some());
        assert!(fv.vwap.is_some());
    }

    #[test]
    fn price_is_last_close() {
        let series = sample_series(10);
        let last_close = series.candles.last().unwrap().c;
        let regime = Regime { label: RegimeLabel::Volatile, confidence: 0.5 };
        let fv = build_feature_vector(&series, regime);
        assert!((fv.price - last_close).abs() < 1e-9);
    }
}
