// =============================================================================
// Bot Bank (C4)
// =============================================================================
//
// Each bot is a stateless pure function `analyze(context) -> BotVote | abstain`.
// The catalog groups ~60 concrete bots across twelve categories by building
// them from a small set of reusable, parameterized "shapes" (trend-following,
// mean-reversion, breakout, oscillator-extreme, volume-confirmation,
// volatility-expansion, pattern, derivatives-bias, contrarian-fade,
// on-chain-bias, sentiment-bias, ai-context, plus a composite-confluence
// shape for the specialized category) — mirroring the data-driven catalog
// style of `arena::profile::default_profiles`.

pub mod catalog;
pub mod context;
pub mod registry;
pub mod shapes;
pub mod votes;

pub use context::BotContext;
pub use registry::BotRegistry;
pub use votes::apply_guardrails;

use crate::types::{BotCategory, BotVote};

/// A stateless, concurrency-safe trading signal generator.
pub trait Bot: Send + Sync {
    fn name(&self) -> &str;
    fn category(&self) -> BotCategory;
    fn analyze(&self, ctx: &BotContext) -> Option<BotVote>;
}
