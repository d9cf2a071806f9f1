// =============================================================================
// Core data model — shared types for the scan pipeline and the learning loop
// =============================================================================
//
// These types are the canonical persisted/ephemeral shapes described in the
// engine's data model. Field names here are authoritative: provider clients,
// the aggregation engine, and the store all normalize into these shapes
// rather than leaking their own field-name variants (`confidence` vs
// `confidence_score`, `ticker` vs `coin_symbol`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque 128-bit identifier used for every entity in the system.
pub type Id = Uuid;

pub fn new_id() -> Id {
    Uuid::new_v4()
}

// =============================================================================
// Coin
// =============================================================================

/// A market constituent as resolved by the universe selection step.
/// Immutable within a scan; re-fetched at the start of every scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    pub market_cap: f64,
    pub rank: u32,
}

// =============================================================================
// ScanRun
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanRunStatus {
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for ScanRunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterScope {
    All,
    Alt,
}

/// One orchestrated scan. Created at scan start with `status = Running`;
/// transitions exactly once to `Completed` or `Failed` when the orchestrator
/// returns or the global deadline is reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRun {
    pub id: Id,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: ScanRunStatus,
    pub scan_type: String,
    pub filter_scope: FilterScope,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub coin_limit: u32,
    pub confidence_threshold: f64,
    pub total_coins: u32,
    pub total_bots: u32,
    pub total_signals: u32,
    pub error: Option<String>,
}

impl ScanRun {
    pub fn new(spec: &ScanSpec) -> Self {
        Self {
            id: new_id(),
            started_at: Utc::now(),
            completed_at: None,
            status: ScanRunStatus::Running,
            scan_type: spec.scan_type.clone(),
            filter_scope: spec.filter_scope,
            min_price: spec.min_price,
            max_price: spec.max_price,
            coin_limit: spec.coin_limit,
            confidence_threshold: spec.confidence_threshold,
            total_coins: 0,
            total_bots: 0,
            total_signals: 0,
            error: None,
        }
    }
}

/// The caller-supplied request that kicks off a scan (§6 External Interfaces).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSpec {
    pub scan_type: String,
    pub filter_scope: FilterScope,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub coin_limit: u32,
    pub confidence_threshold: f64,
    pub use_deep_ai: bool,
}

// =============================================================================
// OHLCV
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    OneHour,
    FourHour,
    OneDay,
    OneWeek,
}

impl Timeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::FourHour => "4h",
            Self::OneDay => "1d",
            Self::OneWeek => "1w",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single OHLCV candle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Candle {
    pub t: i64,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    pub v: f64,
}

/// Ordered sequence of candles for `(coin, timeframe, depth)`. Ephemeral —
/// never persisted (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OhlcvSeries {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub candles: Vec<Candle>,
}

impl OhlcvSeries {
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.c).collect()
    }
}

// =============================================================================
// Derivatives / options / on-chain / sentiment normalized shapes (C1/C2)
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Derivatives {
    pub funding_rate: Option<f64>,
    pub open_interest: Option<f64>,
    pub long_short_ratio: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Options {
    pub put_call_ratio: Option<f64>,
    pub iv: Option<f64>,
    pub max_pain: Option<f64>,
    pub unusual_activity: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DirectionalSignal {
    Bullish,
    Bearish,
    Neutral,
}

impl std::fmt::Display for DirectionalSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "BULLISH"),
            Self::Bearish => write!(f, "BEARISH"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnChain {
    pub whale_activity: Option<f64>,
    pub exchange_flows: Option<f64>,
    pub network_activity: Option<f64>,
    pub overall_signal: DirectionalSignal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentiment {
    pub score: f64,
    pub volume: u64,
    pub classification: DirectionalSignal,
    pub per_source_breakdown: Vec<(String, f64)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRefinement {
    pub refined_confidence: f64,
    pub reasoning: String,
    pub action_plan: String,
    pub risk_assessment: String,
    pub market_context: String,
}

// =============================================================================
// FeatureVector (C3)
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacdValue {
    pub line: f64,
    pub signal: f64,
    pub hist: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BollingerValue {
    pub upper: f64,
    pub mid: f64,
    pub lower: f64,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EmaValue {
    pub ema20: f64,
    pub ema50: f64,
    pub ema200: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StochValue {
    pub k: f64,
    pub d: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IchimokuValue {
    pub tenkan: f64,
    pub kijun: f64,
    pub senkou_a: f64,
    pub senkou_b: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObvTrend {
    Rising,
    Falling,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegimeLabel {
    Bull,
    Bear,
    Sideways,
    Volatile,
}

impl std::fmt::Display for RegimeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bull => write!(f, "BULL"),
            Self::Bear => write!(f, "BEAR"),
            Self::Sideways => write!(f, "SIDEWAYS"),
            Self::Volatile => write!(f, "VOLATILE"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Regime {
    pub label: RegimeLabel,
    pub confidence: f64,
}

/// Derived indicators for one `(coin, timeframe)`. Every indicator is `None`
/// when there is not enough history to compute it — never a fabricated zero
/// (§4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub price: f64,
    pub rsi: Option<f64>,
    pub macd: Option<MacdValue>,
    pub bollinger: Option<BollingerValue>,
    pub ema: Option<EmaValue>,
    pub sma20: Option<f64>,
    pub atr: Option<f64>,
    pub adx: Option<f64>,
    pub stoch: Option<StochValue>,
    pub cci: Option<f64>,
    pub williams_r: Option<f64>,
    pub vwap: Option<f64>,
    pub obv_trend: Option<ObvTrend>,
    pub ichimoku: Option<IchimokuValue>,
    pub parabolic_sar: Option<f64>,
    pub regime: Regime,
}

// =============================================================================
// BotVote / BotCategory (C4)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BotCategory {
    Trend,
    MeanReversion,
    Momentum,
    Volume,
    Volatility,
    Pattern,
    Derivatives,
    Contrarian,
    OnChain,
    Sentiment,
    Specialized,
    Ai,
}

impl std::fmt::Display for BotCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Trend => "trend",
            Self::MeanReversion => "mean_reversion",
            Self::Momentum => "momentum",
            Self::Volume => "volume",
            Self::Volatility => "volatility",
            Self::Pattern => "pattern",
            Self::Derivatives => "derivatives",
            Self::Contrarian => "contrarian",
            Self::OnChain => "on_chain",
            Self::Sentiment => "sentiment",
            Self::Specialized => "specialized",
            Self::Ai => "ai",
        };
        write!(f, "{s}")
    }
}

/// A single bot's output for one coin in one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotVote {
    pub bot_name: String,
    pub bot_category: BotCategory,
    pub direction: Direction,
    /// Integer confidence in `[1, 10]`, fixed at vote time.
    pub confidence: u8,
    pub entry: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
    pub leverage: u8,
    pub rationale: String,
}

// =============================================================================
// Recommendation (C5 output)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskNote {
    None,
    HighUncertainty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: Id,
    pub run_id: Id,
    pub coin: String,
    pub ticker: String,
    pub current_price: f64,
    pub consensus_direction: Direction,
    pub avg_confidence: f64,
    pub bot_count: u32,
    pub long_bots: u32,
    pub short_bots: u32,
    pub avg_entry: f64,
    pub avg_take_profit: f64,
    pub avg_stop_loss: f64,
    pub predicted_24h: f64,
    pub predicted_48h: f64,
    pub predicted_7d: f64,
    pub predicted_change_24h: f64,
    pub predicted_change_48h: f64,
    pub predicted_change_7d: f64,
    pub market_regime: RegimeLabel,
    pub regime_confidence: f64,
    pub ai_reasoning: Option<String>,
    pub action_plan: Option<String>,
    pub risk_assessment: Option<String>,
    pub market_context: Option<String>,
    pub risk_note: RiskNote,
    pub timeframe_alignment_score: u8,
    pub dominant_timeframe_regime: RegimeLabel,
    pub onchain_signal: Option<DirectionalSignal>,
    pub social_sentiment_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// BotPrediction (C4/C7 output)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeStatus {
    Pending,
    Success,
    Failed,
    Partial,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
            Self::Partial => write!(f, "partial"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotPrediction {
    pub id: Id,
    pub run_id: Id,
    pub bot_name: String,
    pub coin_symbol: String,
    pub coin_name: String,
    pub entry_price: f64,
    pub target_price: f64,
    pub stop_loss: f64,
    pub position_direction: Direction,
    /// Integer in `[1, 10]`, rounded from the aggregation engine's float
    /// intermediate before persistence (§3 invariant).
    pub confidence_score: u8,
    pub leverage: u8,
    pub timestamp: DateTime<Utc>,
    pub market_regime: RegimeLabel,
    pub outcome_status: OutcomeStatus,
    pub outcome_checked_at: Option<DateTime<Utc>>,
    pub outcome_price: Option<f64>,
    pub profit_loss_percent: Option<f64>,
}

// =============================================================================
// PricePoint / TPSLEvent (C7)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub coin: String,
    pub price: f64,
    pub volume_24h: Option<f64>,
    pub market_cap: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TpslEventType {
    TakeProfit,
    StopLoss,
}

impl std::fmt::Display for TpslEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TakeProfit => write!(f, "TAKE_PROFIT"),
            Self::StopLoss => write!(f, "STOP_LOSS"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TpslEvent {
    pub prediction_id: Id,
    pub event_type: TpslEventType,
    pub entry_price: f64,
    pub target_price: f64,
    pub actual_hit_price: f64,
    pub hit_at: DateTime<Utc>,
    pub hours_to_hit: f64,
    pub profit_loss_percent: f64,
}

// =============================================================================
// BotAccuracyMetrics / probation / guardrails (C8)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightHistoryEntry {
    pub at: DateTime<Utc>,
    pub from: f64,
    pub to: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotAccuracyMetrics {
    pub bot_name: String,
    pub market_regime: RegimeLabel,
    pub total_predictions: u32,
    pub correct_predictions: u32,
    pub accuracy_rate: f64,
    pub avg_profit_loss: f64,
    pub win_rate: f64,
    pub last_7d_accuracy: f64,
    pub last_30d_accuracy: f64,
    pub current_weight: f64,
    pub is_enabled: bool,
    pub auto_disabled_at: Option<DateTime<Utc>>,
    pub auto_disabled_reason: Option<String>,
    pub weight_history: Vec<WeightHistoryEntry>,
}

impl BotAccuracyMetrics {
    pub fn new(bot_name: impl Into<String>, market_regime: RegimeLabel) -> Self {
        Self {
            bot_name: bot_name.into(),
            market_regime,
            total_predictions: 0,
            correct_predictions: 0,
            accuracy_rate: 0.0,
            avg_profit_loss: 0.0,
            win_rate: 0.0,
            last_7d_accuracy: 0.0,
            last_30d_accuracy: 0.0,
            current_weight: 1.0,
            is_enabled: true,
            auto_disabled_at: None,
            auto_disabled_reason: None,
            weight_history: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotGuardrails {
    pub max_leverage: u8,
    pub min_confidence_required: f64,
    pub stop_loss_multiplier: f64,
    pub max_position_size_percent: f64,
}

impl Default for BotGuardrails {
    fn default() -> Self {
        Self {
            max_leverage: 5,
            min_confidence_required: 0.0,
            stop_loss_multiplier: 1.0,
            max_position_size_percent: 5.0,
        }
    }
}

impl BotGuardrails {
    pub fn probation() -> Self {
        Self {
            max_leverage: 3,
            min_confidence_required: 0.70,
            stop_loss_multiplier: 0.50,
            max_position_size_percent: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotProbationStatus {
    pub bot_name: String,
    pub is_on_probation: bool,
    pub probation_start: Option<DateTime<Utc>>,
    pub probation_end: Option<DateTime<Utc>>,
    pub probation_predictions_count: u32,
    pub probation_correct_count: u32,
    pub times_disabled: u32,
    pub times_reenabled: u32,
    pub permanently_disabled: bool,
    pub guardrails: BotGuardrails,
}

impl BotProbationStatus {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
            is_on_probation: false,
            probation_start: None,
            probation_end: None,
            probation_predictions_count: 0,
            probation_correct_count: 0,
            times_disabled: 0,
            times_reenabled: 0,
            permanently_disabled: false,
            guardrails: BotGuardrails::default(),
        }
    }

    /// Bot is eligible to vote iff enabled and not permanently disabled.
    /// `is_enabled` is tracked on `BotAccuracyMetrics`; this method only
    /// covers the permanent-disable half of the invariant so callers must
    /// still check `BotAccuracyMetrics::is_enabled` (§3 invariant).
    pub fn eligible(&self) -> bool {
        !self.permanently_disabled
    }
}

/// Replace non-finite floats with `None` before persistence (§3, §7).
pub fn sanitize(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// Clamp and round a float confidence into the persisted integer domain
/// `[1, 10]` (§3 invariant).
pub fn round_confidence(value: f64) -> u8 {
    value.round().clamp(1.0, 10.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_rejects_non_finite() {
        assert_eq!(sanitize(f64::NAN), None);
        assert_eq!(sanitize(f64::INFINITY), None);
        assert_eq!(sanitize(-f64::INFINITY), None);
        assert_eq!(sanitize(1.5), Some(1.5));
    }

    #[test]
    fn round_confidence_clamps_to_range() {
        assert_eq!(round_confidence(0.2), 1);
        assert_eq!(round_confidence(11.9), 10);
        assert_eq!(round_confidence(6.5), 7);
        assert_eq!(round_confidence(6.4), 6);
    }

    #[test]
    fn probation_eligible_tracks_permanent_disable() {
        let mut p = BotProbationStatus::new("trend_rider");
        assert!(p.eligible());
        p.permanently_disabled = true;
        assert!(!p.eligible());
    }
}
