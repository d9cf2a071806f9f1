// =============================================================================
// In-memory Store implementation
// =============================================================================
//
// Backed by `parking_lot::RwLock`-guarded maps, following `app_state.rs`'s
// concurrency style. Not a production datastore: restarting the process
// loses every scan run, recommendation, and accuracy record. Exists so the
// binary can run standalone and so tests don't need a real database.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::store::{RecommendationBatch, Store, StoreError};
use crate::types::{
    BotAccuracyMetrics, BotPrediction, BotProbationStatus, Id, PricePoint, Recommendation,
    RegimeLabel, ScanRun, TpslEvent,
};

const SCAN_RUN_CHANGE_CHANNEL_CAPACITY: usize = 256;

pub struct InMemoryStore {
    scan_runs: RwLock<HashMap<Id, ScanRun>>,
    recommendations: RwLock<Vec<Recommendation>>,
    predictions: RwLock<HashMap<Id, BotPrediction>>,
    price_points: RwLock<Vec<PricePoint>>,
    tpsl_events: RwLock<Vec<TpslEvent>>,
    bot_accuracy: RwLock<HashMap<(String, RegimeLabel), BotAccuracyMetrics>>,
    probation: RwLock<HashMap<String, BotProbationStatus>>,
    scan_run_changes: broadcast::Sender<ScanRun>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        let (scan_run_changes, _) = broadcast::channel(SCAN_RUN_CHANGE_CHANNEL_CAPACITY);
        Self {
            scan_runs: RwLock::new(HashMap::new()),
            recommendations: RwLock::new(Vec::new()),
            predictions: RwLock::new(HashMap::new()),
            price_points: RwLock::new(Vec::new()),
            tpsl_events: RwLock::new(Vec::new()),
            bot_accuracy: RwLock::new(HashMap::new()),
            probation: RwLock::new(HashMap::new()),
            scan_run_changes,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_scan_run(&self, run: ScanRun) -> Result<(), StoreError> {
        self.scan_runs.write().insert(run.id, run);
        Ok(())
    }

    async fn update_scan_run(&self, run: ScanRun) -> Result<(), StoreError> {
        self.scan_runs.write().insert(run.id, run.clone());
        // A lagging or absent receiver is not a write failure.
        let _ = self.scan_run_changes.send(run);
        Ok(())
    }

    async fn get_scan_run(&self, run_id: Id) -> Result<ScanRun, StoreError> {
        self.scan_runs
            .read()
            .get(&run_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("scan_run {run_id}")))
    }

    async fn insert_recommendation_batch(&self, batch: RecommendationBatch) -> Result<(), StoreError> {
        self.recommendations.write().push(batch.recommendation);
        let mut predictions = self.predictions.write();
        for prediction in batch.predictions {
            predictions.insert(prediction.id, prediction);
        }
        Ok(())
    }

    async fn insert_price_point(&self, point: PricePoint) -> Result<(), StoreError> {
        self.price_points.write().push(point);
        Ok(())
    }

    async fn insert_tpsl_event(&self, event: TpslEvent) -> Result<(), StoreError> {
        self.tpsl_events.write().push(event);
        Ok(())
    }

    async fn pending_predictions(&self) -> Result<Vec<BotPrediction>, StoreError> {
        Ok(self
            .predictions
            .read()
            .values()
            .filter(|p| p.outcome_status == crate::types::OutcomeStatus::Pending)
            .cloned()
            .collect())
    }

    async fn finalized_predictions(&self) -> Result<Vec<BotPrediction>, StoreError> {
        Ok(self
            .predictions
            .read()
            .values()
            .filter(|p| p.outcome_status != crate::types::OutcomeStatus::Pending)
            .cloned()
            .collect())
    }

    async fn update_prediction_outcome(&self, prediction: BotPrediction) -> Result<(), StoreError> {
        self.predictions.write().insert(prediction.id, prediction);
        Ok(())
    }

    async fn upsert_bot_accuracy(&self, metrics: BotAccuracyMetrics) -> Result<(), StoreError> {
        self.bot_accuracy.write().insert((metrics.bot_name.clone(), metrics.market_regime), metrics);
        Ok(())
    }

    async fn read_bot_accuracy_snapshot(
        &self,
        bot_name: &str,
        regime: RegimeLabel,
    ) -> Result<Option<BotAccuracyMetrics>, StoreError> {
        Ok(self.bot_accuracy.read().get(&(bot_name.to_string(), regime)).cloned())
    }

    async fn all_bot_accuracy(&self) -> Result<Vec<BotAccuracyMetrics>, StoreError> {
        Ok(self.bot_accuracy.read().values().cloned().collect())
    }

    async fn upsert_probation_status(&self, status: BotProbationStatus) -> Result<(), StoreError> {
        self.probation.write().insert(status.bot_name.clone(), status);
        Ok(())
    }

    async fn read_probation_status(&self, bot_name: &str) -> Result<Option<BotProbationStatus>, StoreError> {
        Ok(self.probation.read().get(bot_name).cloned())
    }

    async fn all_probation_status(&self) -> Result<Vec<BotProbationStatus>, StoreError> {
        Ok(self.probation.read().values().cloned().collect())
    }

    fn subscribe_scan_run_changes(&self) -> broadcast::Receiver<ScanRun> {
        self.scan_run_changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FilterScope, ScanSpec};

    fn sample_spec() -> ScanSpec {
        ScanSpec {
            scan_type: "quick".to_string(),
            filter_scope: FilterScope::All,
            min_price: None,
            max_price: None,
            coin_limit: 50,
            confidence_threshold: 6.0,
            use_deep_ai: false,
        }
    }

    #[tokio::test]
    async fn create_then_get_scan_run_round_trips() {
        let store = InMemoryStore::new();
        let run = ScanRun::new(&sample_spec());
        let id = run.id;
        store.create_scan_run(run).await.unwrap();
        let fetched = store.get_scan_run(id).await.unwrap();
        assert_eq!(fetched.id, id);
    }

    #[tokio::test]
    async fn get_missing_scan_run_errors() {
        let store = InMemoryStore::new();
        let result = store.get_scan_run(crate::types::new_id()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn update_scan_run_broadcasts_to_subscribers() {
        let store = InMemoryStore::new();
        let mut rx = store.subscribe_scan_run_changes();
        let run = ScanRun::new(&sample_spec());
        store.create_scan_run(run.clone()).await.unwrap();
        store.update_scan_run(run.clone()).await.unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, run.id);
    }

    #[tokio::test]
    async fn bot_accuracy_upsert_and_read_round_trip() {
        let store = InMemoryStore::new();
        let metrics = BotAccuracyMetrics::new("trend_rider", RegimeLabel::Bull);
        store.upsert_bot_accuracy(metrics.clone()).await.unwrap();
        let fetched = store.read_bot_accuracy_snapshot("trend_rider", RegimeLabel::Bull).await.unwrap();
        assert!(fetched.is_some());
    }
}
