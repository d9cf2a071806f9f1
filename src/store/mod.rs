// =============================================================================
// Persistence abstraction
// =============================================================================
//
// Spec §1 explicitly excludes persistence engine internals as a deliverable,
// but §3/§6 require the rest of the system to depend on *some* store. This
// module models that collaborator as an object-safe async trait (one method
// per table operation from §3) plus a change-feed stand-in. `InMemoryStore`
// is the only implementation shipped; it backs the binary when run
// standalone and backs tests. It is not a production datastore.

pub mod in_memory;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::types::{
    BotAccuracyMetrics, BotPrediction, BotProbationStatus, Id, PricePoint, Recommendation,
    RegimeLabel, ScanRun, TpslEvent,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("write failed: {0}")]
    WriteFailed(String),
}

/// One batched write produced at the end of a coin's aggregation pipeline
/// (§4.6 step 4e: "write it and its per-bot rows in one batched insert").
pub struct RecommendationBatch {
    pub recommendation: Recommendation,
    pub predictions: Vec<BotPrediction>,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn create_scan_run(&self, run: ScanRun) -> Result<(), StoreError>;
    async fn update_scan_run(&self, run: ScanRun) -> Result<(), StoreError>;
    async fn get_scan_run(&self, run_id: Id) -> Result<ScanRun, StoreError>;

    async fn insert_recommendation_batch(&self, batch: RecommendationBatch) -> Result<(), StoreError>;

    async fn insert_price_point(&self, point: PricePoint) -> Result<(), StoreError>;
    async fn insert_tpsl_event(&self, event: TpslEvent) -> Result<(), StoreError>;

    async fn pending_predictions(&self) -> Result<Vec<BotPrediction>, StoreError>;
    async fn finalized_predictions(&self) -> Result<Vec<BotPrediction>, StoreError>;
    async fn update_prediction_outcome(&self, prediction: BotPrediction) -> Result<(), StoreError>;

    async fn upsert_bot_accuracy(&self, metrics: BotAccuracyMetrics) -> Result<(), StoreError>;
    async fn read_bot_accuracy_snapshot(
        &self,
        bot_name: &str,
        regime: RegimeLabel,
    ) -> Result<Option<BotAccuracyMetrics>, StoreError>;
    async fn all_bot_accuracy(&self) -> Result<Vec<BotAccuracyMetrics>, StoreError>;

    async fn upsert_probation_status(&self, status: BotProbationStatus) -> Result<(), StoreError>;
    async fn read_probation_status(&self, bot_name: &str) -> Result<Option<BotProbationStatus>, StoreError>;
    async fn all_probation_status(&self) -> Result<Vec<BotProbationStatus>, StoreError>;

    /// Stand-in for a realtime change feed on `scan_run` rows (§3). Returns a
    /// receiver that observes every `update_scan_run` call going forward;
    /// the sender side is held by the store implementation.
    fn subscribe_scan_run_changes(&self) -> broadcast::Receiver<ScanRun>;
}
