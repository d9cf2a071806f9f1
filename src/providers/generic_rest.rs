// =============================================================================
// Generic REST provider clients
// =============================================================================
//
// Derivatives, options, on-chain, sentiment and LLM vendors each expose their
// own bespoke JSON shape; pinning a concrete client to one named vendor's wire
// format is out of scope here. Instead each client is configured with a URL
// template and a small field-mapping closure, so swapping providers is a
// config change rather than a new type. This mirrors the teacher's own
// preference for thin typed wrappers over `reqwest` rather than a generated
// SDK.

use async_trait::async_trait;
use serde_json::Value;
use tracing::instrument;

use crate::providers::{
    DerivativesClient, LlmClient, OnChainClient, OptionsClient, ProviderOutcome, SentimentClient,
};
use crate::types::{Derivatives, DirectionalSignal, LlmRefinement, OnChain, Options, Sentiment};

fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(8))
        .build()
        .expect("failed to build reqwest client")
}

async fn fetch_json(client: &reqwest::Client, url: &str) -> Result<Value, ProviderOutcome<()>> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| ProviderOutcome::TransientError { reason: e.to_string() })?;

    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderOutcome::RateLimited { reset_hint: None });
    }
    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(ProviderOutcome::Unsupported);
    }
    if !resp.status().is_success() {
        return Err(ProviderOutcome::PermanentError { reason: format!("status {}", resp.status()) });
    }

    resp.json::<Value>()
        .await
        .map_err(|e| ProviderOutcome::TransientError { reason: e.to_string() })
}

fn as_f64(v: &Value, key: &str) -> Option<f64> {
    v.get(key).and_then(|f| f.as_f64())
}

/// Derivatives (funding rate, open interest, long/short ratio) from any
/// vendor whose REST response is flat JSON keyed by the field names below.
pub struct RestDerivativesClient {
    id: String,
    url_template: String,
    client: reqwest::Client,
}

impl RestDerivativesClient {
    pub fn new(id: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self { id: id.into(), url_template: url_template.into(), client: build_client() }
    }

    fn url_for(&self, symbol: &str) -> String {
        self.url_template.replace("{symbol}", symbol)
    }
}

#[async_trait]
impl DerivativesClient for RestDerivativesClient {
    fn id(&self) -> &str {
        &self.id
    }

    #[instrument(skip(self), name = "generic_rest::derivs")]
    async fn derivs(&self, symbol: &str) -> ProviderOutcome<Derivatives> {
        let body = match fetch_json(&self.client, &self.url_for(symbol)).await {
            Ok(v) => v,
            Err(outcome) => return coerce_outcome(outcome),
        };
        ProviderOutcome::Ok(Derivatives {
            funding_rate: as_f64(&body, "funding_rate"),
            open_interest: as_f64(&body, "open_interest"),
            long_short_ratio: as_f64(&body, "long_short_ratio"),
        })
    }
}

pub struct RestOptionsClient {
    id: String,
    url_template: String,
    client: reqwest::Client,
}

impl RestOptionsClient {
    pub fn new(id: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self { id: id.into(), url_template: url_template.into(), client: build_client() }
    }
}

#[async_trait]
impl OptionsClient for RestOptionsClient {
    fn id(&self) -> &str {
        &self.id
    }

    #[instrument(skip(self), name = "generic_rest::options")]
    async fn options(&self, symbol: &str) -> ProviderOutcome<Options> {
        let url = self.url_template.replace("{symbol}", symbol);
        let body = match fetch_json(&self.client, &url).await {
            Ok(v) => v,
            Err(outcome) => return coerce_outcome(outcome),
        };
        ProviderOutcome::Ok(Options {
            put_call_ratio: as_f64(&body, "put_call_ratio"),
            iv: as_f64(&body, "iv"),
            max_pain: as_f64(&body, "max_pain"),
            unusual_activity: body.get("unusual_activity").and_then(|v| v.as_bool()).unwrap_or(false),
        })
    }
}

pub struct RestOnChainClient {
    id: String,
    url_template: String,
    client: reqwest::Client,
}

impl RestOnChainClient {
    pub fn new(id: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self { id: id.into(), url_template: url_template.into(), client: build_client() }
    }
}

fn directional_signal_from(body: &Value) -> DirectionalSignal {
    match body.get("overall_signal").and_then(|v| v.as_str()) {
        Some("bullish") => DirectionalSignal::Bullish,
        Some("bearish") => DirectionalSignal::Bearish,
        _ => DirectionalSignal::Neutral,
    }
}

#[async_trait]
impl OnChainClient for RestOnChainClient {
    fn id(&self) -> &str {
        &self.id
    }

    #[instrument(skip(self), name = "generic_rest::onchain")]
    async fn onchain(&self, symbol: &str) -> ProviderOutcome<OnChain> {
        let url = self.url_template.replace("{symbol}", symbol);
        let body = match fetch_json(&self.client, &url).await {
            Ok(v) => v,
            Err(outcome) => return coerce_outcome(outcome),
        };
        ProviderOutcome::Ok(OnChain {
            whale_activity: as_f64(&body, "whale_activity"),
            exchange_flows: as_f64(&body, "exchange_flows"),
            network_activity: as_f64(&body, "network_activity"),
            overall_signal: directional_signal_from(&body),
        })
    }
}

pub struct RestSentimentClient {
    id: String,
    url_template: String,
    client: reqwest::Client,
}

impl RestSentimentClient {
    pub fn new(id: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self { id: id.into(), url_template: url_template.into(), client: build_client() }
    }
}

#[async_trait]
impl SentimentClient for RestSentimentClient {
    fn id(&self) -> &str {
        &self.id
    }

    #[instrument(skip(self), name = "generic_rest::sentiment")]
    async fn sentiment(&self, symbol: &str) -> ProviderOutcome<Sentiment> {
        let url = self.url_template.replace("{symbol}", symbol);
        let body = match fetch_json(&self.client, &url).await {
            Ok(v) => v,
            Err(outcome) => return coerce_outcome(outcome),
        };
        let score = as_f64(&body, "score").unwrap_or(0.0);
        let classification = if score > 0.15 {
            DirectionalSignal::Bullish
        } else if score < -0.15 {
            DirectionalSignal::Bearish
        } else {
            DirectionalSignal::Neutral
        };
        let per_source_breakdown = body
            .get("sources")
            .and_then(|v| v.as_object())
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_f64().map(|f| (k.clone(), f)))
                    .collect()
            })
            .unwrap_or_default();
        ProviderOutcome::Ok(Sentiment {
            score,
            volume: body.get("volume").and_then(|v| v.as_u64()).unwrap_or(0),
            classification,
            per_source_breakdown,
        })
    }
}

/// Sends a single prompt to a JSON-over-HTTP completion endpoint and parses
/// the response as a structured refinement. The exact vendor wire format
/// (message roles, model name, token accounting) is left to `url_template`
/// and `api_key` configuration rather than hardcoded against one vendor.
pub struct RestLlmClient {
    id: String,
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl RestLlmClient {
    pub fn new(id: impl Into<String>, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { id: id.into(), url: url.into(), api_key: api_key.into(), client: build_client() }
    }
}

#[async_trait]
impl LlmClient for RestLlmClient {
    fn id(&self) -> &str {
        &self.id
    }

    #[instrument(skip(self, prompt), name = "generic_rest::llm_analyze")]
    async fn analyze(&self, prompt: &str) -> ProviderOutcome<LlmRefinement> {
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await;

        let resp = match resp {
            Ok(r) => r,
            Err(e) => return ProviderOutcome::TransientError { reason: e.to_string() },
        };

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return ProviderOutcome::RateLimited { reset_hint: None };
        }
        if !resp.status().is_success() {
            return ProviderOutcome::TransientError { reason: format!("status {}", resp.status()) };
        }

        let body: Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => return ProviderOutcome::TransientError { reason: e.to_string() },
        };

        let refined_confidence = as_f64(&body, "refined_confidence").unwrap_or(0.0);
        let string_field = |key: &str| body.get(key).and_then(|v| v.as_str()).unwrap_or("").to_string();

        ProviderOutcome::Ok(LlmRefinement {
            refined_confidence,
            reasoning: string_field("reasoning"),
            action_plan: string_field("action_plan"),
            risk_assessment: string_field("risk_assessment"),
            market_context: string_field("market_context"),
        })
    }
}

fn coerce_outcome<T>(outcome: ProviderOutcome<()>) -> ProviderOutcome<T> {
    match outcome {
        ProviderOutcome::Ok(()) => unreachable!("fetch_json never returns Ok via the Err branch"),
        ProviderOutcome::RateLimited { reset_hint } => ProviderOutcome::RateLimited { reset_hint },
        ProviderOutcome::TransientError { reason } => ProviderOutcome::TransientError { reason },
        ProviderOutcome::PermanentError { reason } => ProviderOutcome::PermanentError { reason },
        ProviderOutcome::Unsupported => ProviderOutcome::Unsupported,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directional_signal_parses_bullish() {
        let body = serde_json::json!({ "overall_signal": "bullish" });
        assert_eq!(directional_signal_from(&body), DirectionalSignal::Bullish);
    }

    #[test]
    fn directional_signal_defaults_neutral() {
        let body = serde_json::json!({});
        assert_eq!(directional_signal_from(&body), DirectionalSignal::Neutral);
    }

    #[test]
    fn url_template_substitutes_symbol() {
        let client = RestDerivativesClient::new("x", "https://example.com/{symbol}/funding");
        assert_eq!(client.url_for("BTC"), "https://example.com/BTC/funding");
    }
}
