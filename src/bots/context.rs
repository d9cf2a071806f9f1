// =============================================================================
// Bot input context
// =============================================================================
//
// Bundles the per-coin `FeatureVector` with the other normalized C1/C2 shapes
// a bot may need. Every field besides `features` is optional — a bot whose
// required field is absent must abstain (§4.4).

use crate::types::{Derivatives, FeatureVector, LlmRefinement, OnChain, Options, Sentiment};

pub struct BotContext<'a> {
    pub features: &'a FeatureVector,
    pub derivatives: Option<&'a Derivatives>,
    pub options: Option<&'a Options>,
    pub onchain: Option<&'a OnChain>,
    pub sentiment: Option<&'a Sentiment>,
    pub llm: Option<&'a LlmRefinement>,
}
