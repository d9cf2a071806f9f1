// =============================================================================
// Configuration surface — hot-reloadable engine settings with atomic save
// =============================================================================
//
// Generalizes `runtime_config.rs`'s atomic tmp+rename save/load pattern and
// `#[serde(default)]` convention to the keys spec §6 "Configuration"
// enumerates: provider order per kind, scan profiles, the stablecoin and
// on-chain allowlists, per-coin/per-scan deadlines, and cron cadences.
// Provider credentials are loaded from the environment and deliberately
// never part of this (de)serializable struct — same rule the teacher states
// outright in `binance/client.rs`: "the secret key is never logged or
// serialized".

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::FilterScope;

fn default_true() -> bool {
    true
}

fn default_stablecoins() -> Vec<String> {
    vec!["USDT".into(), "USDC".into(), "BUSD".into(), "TUSD".into(), "DAI".into(), "FDUSD".into()]
}

fn default_onchain_allowlist() -> Vec<String> {
    vec!["BTC".into(), "ETH".into(), "SOL".into(), "BNB".into(), "XRP".into(), "ADA".into(), "AVAX".into()]
}

fn default_provider_order() -> HashMap<String, Vec<String>> {
    let mut order = HashMap::new();
    order.insert("ohlcv".to_string(), vec!["binance".to_string()]);
    order.insert("derivatives".to_string(), vec!["generic_derivs".to_string()]);
    order.insert("options".to_string(), vec!["generic_options".to_string()]);
    order.insert("onchain".to_string(), vec!["generic_onchain".to_string()]);
    order.insert("sentiment".to_string(), vec!["generic_sentiment".to_string()]);
    order.insert("llm".to_string(), vec!["generic_llm".to_string()]);
    order
}

fn default_coin_task_deadline_secs() -> u64 {
    90
}

fn default_price_sample_interval_secs() -> u64 {
    900
}

fn default_outcome_horizon_check_interval_secs() -> u64 {
    900
}

fn default_metrics_rollup_interval_secs() -> u64 {
    6 * 3600
}

fn default_weight_adjustment_cron() -> String {
    "0 5 * * *".to_string()
}

fn default_bounded_concurrency() -> usize {
    5
}

fn default_filter_scope() -> FilterScope {
    FilterScope::All
}

/// Per-`scan_type` behavior (§10.5): `"quick"` and `"deep"` are the two
/// built-in profiles; operators may add more via the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProfile {
    pub coin_limit: u32,
    #[serde(default = "default_bounded_concurrency")]
    pub concurrency: usize,
    pub deadline_budget_secs: u64,
    pub use_llm: bool,
    #[serde(default = "default_filter_scope")]
    pub filter_scope_default: FilterScope,
}

fn default_scan_profiles() -> HashMap<String, ScanProfile> {
    let mut profiles = HashMap::new();
    profiles.insert(
        "quick".to_string(),
        ScanProfile {
            coin_limit: 50,
            concurrency: 8,
            deadline_budget_secs: 4 * 60,
            use_llm: false,
            filter_scope_default: FilterScope::All,
        },
    );
    profiles.insert(
        "deep".to_string(),
        ScanProfile {
            coin_limit: 200,
            concurrency: 5,
            deadline_budget_secs: 8 * 60,
            use_llm: true,
            filter_scope_default: FilterScope::All,
        },
    );
    profiles
}

fn default_scan_cron() -> HashMap<String, String> {
    let mut cron = HashMap::new();
    cron.insert("quick".to_string(), "*/30 * * * *".to_string());
    cron.insert("deep".to_string(), "0 */4 * * *".to_string());
    cron
}

/// Top-level configuration for the signal engine.
///
/// Every field carries a serde default so adding a new key never breaks
/// loading an older config file on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Ordered provider ids per data kind (`"ohlcv"`, `"derivatives"`,
    /// `"options"`, `"onchain"`, `"sentiment"`, `"llm"`), consulted by
    /// whatever wires up the `Router` at startup.
    #[serde(default = "default_provider_order")]
    pub provider_order: HashMap<String, Vec<String>>,

    #[serde(default = "default_scan_profiles")]
    pub scan_profiles: HashMap<String, ScanProfile>,

    #[serde(default)]
    pub scan_cron: HashMap<String, String>,

    #[serde(default = "default_stablecoins")]
    pub stablecoins: Vec<String>,

    #[serde(default = "default_onchain_allowlist")]
    pub onchain_allowlist: Vec<String>,

    /// Overall deadline for a single coin's pipeline within a scan (§5).
    #[serde(default = "default_coin_task_deadline_secs")]
    pub coin_task_deadline_secs: u64,

    /// Cadence of the outcome tracker's price-sampling loop (§4.7).
    #[serde(default = "default_price_sample_interval_secs")]
    pub price_sample_interval_secs: u64,

    /// Cadence of the 24h/48h/7d horizon-evaluation sweep (§4.7).
    #[serde(default = "default_outcome_horizon_check_interval_secs")]
    pub outcome_horizon_check_interval_secs: u64,

    /// Cadence of the `BotAccuracyMetrics` rollup (§4.8, "every 6 hours").
    #[serde(default = "default_metrics_rollup_interval_secs")]
    pub metrics_rollup_interval_secs: u64,

    /// Cron expression for the daily weight-adjustment pass (§4.8).
    #[serde(default = "default_weight_adjustment_cron")]
    pub weight_adjustment_cron: String,

    /// Feature flag retained from the teacher's config surface: whether deep
    /// AI refinement may run at all, independent of a scan profile's
    /// `use_llm` (acts as a global kill switch for LLM spend).
    #[serde(default = "default_true")]
    pub ai_refinement_enabled: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            provider_order: default_provider_order(),
            scan_profiles: default_scan_profiles(),
            scan_cron: default_scan_cron(),
            stablecoins: default_stablecoins(),
            onchain_allowlist: default_onchain_allowlist(),
            coin_task_deadline_secs: default_coin_task_deadline_secs(),
            price_sample_interval_secs: default_price_sample_interval_secs(),
            outcome_horizon_check_interval_secs: default_outcome_horizon_check_interval_secs(),
            metrics_rollup_interval_secs: default_metrics_rollup_interval_secs(),
            weight_adjustment_cron: default_weight_adjustment_cron(),
            ai_refinement_enabled: true,
        }
    }
}

impl RuntimeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;
        info!(path = %path.display(), "runtime config loaded");
        Ok(config)
    }

    /// Atomic write: write to a temporary sibling file, then rename, so a
    /// crash mid-write never corrupts the config on disk.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self).context("failed to serialize runtime config")?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;
        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    pub fn is_stablecoin(&self, symbol: &str) -> bool {
        self.stablecoins.iter().any(|s| s.eq_ignore_ascii_case(symbol))
    }

    pub fn onchain_allowed(&self, symbol: &str) -> bool {
        self.onchain_allowlist.iter().any(|s| s.eq_ignore_ascii_case(symbol))
    }
}

/// Provider credentials, loaded once from the environment (via `dotenv`) at
/// startup. Deliberately not `Serialize`/`Deserialize` and not part of
/// `RuntimeConfig` so a secret can never end up in the saved config file.
pub struct ProviderCredentials {
    pub binance_api_key: Option<String>,
    pub binance_api_secret: Option<String>,
    pub llm_api_key: Option<String>,
}

impl ProviderCredentials {
    pub fn from_env() -> Self {
        Self {
            binance_api_key: std::env::var("BINANCE_API_KEY").ok(),
            binance_api_secret: std::env::var("BINANCE_API_SECRET").ok(),
            llm_api_key: std::env::var("LLM_API_KEY").ok(),
        }
    }
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_quick_and_deep_profiles() {
        let cfg = RuntimeConfig::default();
        assert!(cfg.scan_profiles.contains_key("quick"));
        assert!(cfg.scan_profiles.contains_key("deep"));
        assert_eq!(cfg.scan_profiles["deep"].coin_limit, 200);
        assert!(cfg.scan_profiles["deep"].use_llm);
        assert!(!cfg.scan_profiles["quick"].use_llm);
    }

    #[test]
    fn deserialize_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert!(cfg.is_stablecoin("usdt"));
        assert!(cfg.onchain_allowed("BTC"));
        assert_eq!(cfg.coin_task_deadline_secs, 90);
    }

    #[test]
    fn deserialize_partial_json_fills_defaults() {
        let json = r#"{ "stablecoins": ["USDT"] }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.stablecoins, vec!["USDT".to_string()]);
        assert!(cfg.scan_profiles.contains_key("quick"));
    }

    #[test]
    fn roundtrip_serialization() {
        let cfg = RuntimeConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.stablecoins, cfg2.stablecoins);
        assert_eq!(cfg.scan_profiles.len(), cfg2.scan_profiles.len());
    }

    #[test]
    fn credentials_debug_never_prints_secret_values() {
        let creds = ProviderCredentials { binance_api_key: Some("super-secret".to_string()), binance_api_secret: None, llm_api_key: None };
        let debug_output = format!("{creds:?}");
        assert!(!debug_output.contains("super-secret"));
    }
}
