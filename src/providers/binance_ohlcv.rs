// =============================================================================
// Binance OHLCV provider client
// =============================================================================
//
// Public, unsigned REST endpoints only (`/api/v3/klines`, `/api/v3/ticker/24hr`) —
// no API key is needed for market data, unlike the authenticated trading
// client in `binance::client`. Follows the same `reqwest::Client` builder and
// `tracing::instrument` style.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::providers::rate_limit::RateLimitTracker;
use crate::providers::{OhlcvClient, ProviderOutcome};
use crate::types::{Candle, Coin, FilterScope, OhlcvSeries, Timeframe};

pub struct BinanceOhlcvClient {
    base_url: String,
    client: reqwest::Client,
    rate_limit: RateLimitTracker,
}

impl BinanceOhlcvClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");
        Self {
            base_url: "https://api.binance.com".to_string(),
            client,
            rate_limit: RateLimitTracker::new(10, 1000),
        }
    }
}

impl Default for BinanceOhlcvClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct Ticker24hr {
    symbol: String,
    #[serde(rename = "lastPrice")]
    last_price: String,
    #[serde(rename = "quoteVolume")]
    quote_volume: String,
}

fn interval_str(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::OneHour => "1h",
        Timeframe::FourHour => "4h",
        Timeframe::OneDay => "1d",
        Timeframe::OneWeek => "1w",
    }
}

#[async_trait]
impl OhlcvClient for BinanceOhlcvClient {
    fn id(&self) -> &str {
        "binance"
    }

    #[instrument(skip(self), name = "binance_ohlcv::top_coins")]
    async fn top_coins(
        &self,
        limit: u32,
        scope: FilterScope,
        min_price: Option<f64>,
        max_price: Option<f64>,
    ) -> ProviderOutcome<Vec<Coin>> {
        if !self.rate_limit.can_send() {
            return ProviderOutcome::RateLimited { reset_hint: None };
        }

        let url = format!("{}/api/v3/ticker/24hr", self.base_url);
        let resp = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => return ProviderOutcome::TransientError { reason: e.to_string() },
        };
        self.rate_limit.record_sent();

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return ProviderOutcome::RateLimited { reset_hint: None };
        }
        if !resp.status().is_success() {
            return ProviderOutcome::PermanentError { reason: format!("status {}", resp.status()) };
        }

        let tickers: Vec<Ticker24hr> = match resp.json().await {
            Ok(v) => v,
            Err(e) => return ProviderOutcome::TransientError { reason: e.to_string() },
        };

        let mut coins: Vec<Coin> = tickers
            .into_iter()
            .filter_map(|t| {
                if scope == FilterScope::Alt && is_stablecoin_pair(&t.symbol) {
                    return None;
                }
                if !t.symbol.ends_with("USDT") {
                    return None;
                }
                let price: f64 = t.last_price.parse().ok()?;
                let volume: f64 = t.quote_volume.parse().ok()?;
                if let Some(min) = min_price {
                    if price < min {
                        return None;
                    }
                }
                if let Some(max) = max_price {
                    if price > max {
                        return None;
                    }
                }
                let symbol = t.symbol.trim_end_matches("USDT").to_string();
                Some(Coin {
                    symbol: symbol.clone(),
                    name: symbol,
                    current_price: price,
                    market_cap: volume,
                    rank: 0,
                })
            })
            .collect();

        coins.sort_by(|a, b| b.market_cap.partial_cmp(&a.market_cap).unwrap_or(std::cmp::Ordering::Equal));
        coins.truncate(limit as usize);
        for (i, coin) in coins.iter_mut().enumerate() {
            coin.rank = (i + 1) as u32;
        }

        ProviderOutcome::Ok(coins)
    }

    #[instrument(skip(self), name = "binance_ohlcv::ohlcv")]
    async fn ohlcv(&self, symbol: &str, timeframe: Timeframe, depth: u32) -> ProviderOutcome<OhlcvSeries> {
        if !self.rate_limit.can_send() {
            return ProviderOutcome::RateLimited { reset_hint: None };
        }

        let pair = format!("{symbol}USDT");
        let url = format!(
            "{}/api/v3/klines?symbol={pair}&interval={}&limit={depth}",
            self.base_url,
            interval_str(timeframe)
        );

        let resp = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => return ProviderOutcome::TransientError { reason: e.to_string() },
        };
        self.rate_limit.record_sent();

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return ProviderOutcome::RateLimited { reset_hint: None };
        }
        if resp.status() == reqwest::StatusCode::BAD_REQUEST {
            return ProviderOutcome::PermanentError { reason: "unknown symbol".to_string() };
        }
        if !resp.status().is_success() {
            return ProviderOutcome::TransientError { reason: format!("status {}", resp.status()) };
        }

        let raw: Vec<Vec<serde_json::Value>> = match resp.json().await {
            Ok(v) => v,
            Err(e) => return ProviderOutcome::TransientError { reason: e.to_string() },
        };

        let candles: Option<Vec<Candle>> = raw
            .into_iter()
            .map(|row| parse_kline_row(&row))
            .collect();

        match candles {
            Some(candles) => ProviderOutcome::Ok(OhlcvSeries {
                symbol: symbol.to_string(),
                timeframe,
                candles,
            }),
            None => {
                warn!(symbol, "malformed kline row from binance");
                ProviderOutcome::TransientError { reason: "malformed kline payload".to_string() }
            }
        }
    }
}

fn parse_kline_row(row: &[serde_json::Value]) -> Option<Candle> {
    if row.len() < 6 {
        return None;
    }
    Some(Candle {
        t: row[0].as_i64()?,
        o: row[1].as_str()?.parse().ok()?,
        h: row[2].as_str()?.parse().ok()?,
        l: row[3].as_str()?.parse().ok()?,
        c: row[4].as_str()?.parse().ok()?,
        v: row[5].as_str()?.parse().ok()?,
    })
}

fn is_stablecoin_pair(symbol: &str) -> bool {
    const STABLES: &[&str] = &["USDCUSDT", "BUSDUSDT", "TUSDUSDT", "DAIUSDT", "FDUSDUSDT"];
    STABLES.contains(&symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_kline_row() {
        let row = vec![
            serde_json::json!(1620000000000i64),
            serde_json::json!("100.5"),
            serde_json::json!("105.0"),
            serde_json::json!("99.0"),
            serde_json::json!("102.0"),
            serde_json::json!("1000.0"),
        ];
        let candle = parse_kline_row(&row).unwrap();
        assert_eq!(candle.t, 1620000000000);
        assert_eq!(candle.o, 100.5);
        assert_eq!(candle.c, 102.0);
    }

    #[test]
    fn rejects_short_row() {
        let row = vec![serde_json::json!(1)];
        assert!(parse_kline_row(&row).is_none());
    }

    #[test]
    fn recognizes_stablecoin_pairs() {
        assert!(is_stablecoin_pair("USDCUSDT"));
        assert!(!is_stablecoin_pair("BTCUSDT"));
    }
}
