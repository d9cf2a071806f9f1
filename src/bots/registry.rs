// =============================================================================
// Bot registry — catalog + accuracy/probation-aware filtering
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use crate::bots::{catalog::build_catalog, Bot};
use crate::types::{BotAccuracyMetrics, BotProbationStatus, RegimeLabel};

/// Holds the full bot catalog and exposes the regime-aware, probation-aware
/// `enabled_bots` view the scan orchestrator consumes per coin.
pub struct BotRegistry {
    bots: Vec<Arc<dyn Bot>>,
}

impl BotRegistry {
    pub fn new() -> Self {
        Self { bots: build_catalog() }
    }

    pub fn all(&self) -> &[Arc<dyn Bot>] {
        &self.bots
    }

    /// Bots eligible to vote for the given regime: `is_enabled` must be true
    /// on the bot's regime-scoped accuracy record (when one exists — a bot
    /// with no history yet is eligible by default) and the bot must not be
    /// permanently disabled (§4.4).
    pub fn enabled_bots(
        &self,
        regime: RegimeLabel,
        accuracy: &HashMap<(String, RegimeLabel), BotAccuracyMetrics>,
        probation: &HashMap<String, BotProbationStatus>,
    ) -> Vec<&Arc<dyn Bot>> {
        self.bots
            .iter()
            .filter(|bot| {
                let enabled_by_accuracy = accuracy
                    .get(&(bot.name().to_string(), regime))
                    .map(|m| m.is_enabled)
                    .unwrap_or(true);
                let eligible_by_probation = probation.get(bot.name()).map(|p| p.eligible()).unwrap_or(true);
                enabled_by_accuracy && eligible_by_probation
            })
            .collect()
    }
}

impl Default for BotRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_bots_defaults_to_all_without_history() {
        let registry = BotRegistry::new();
        let accuracy = HashMap::new();
        let probation = HashMap::new();
        let enabled = registry.enabled_bots(RegimeLabel::Bull, &accuracy, &probation);
        assert_eq!(enabled.len(), registry.all().len());
    }

    #[test]
    fn enabled_bots_excludes_disabled_accuracy_record() {
        let registry = BotRegistry::new();
        let target = registry.all()[0].name().to_string();
        let mut disabled_metric = BotAccuracyMetrics::new(target.clone(), RegimeLabel::Bull);
        disabled_metric.is_enabled = false;

        let mut accuracy = HashMap::new();
        accuracy.insert((target, RegimeLabel::Bull), disabled_metric);
        let probation = HashMap::new();

        let enabled = registry.enabled_bots(RegimeLabel::Bull, &accuracy, &probation);
        assert_eq!(enabled.len(), registry.all().len() - 1);
    }

    #[test]
    fn enabled_bots_excludes_permanently_disabled_bot() {
        let registry = BotRegistry::new();
        let target = registry.all()[0].name().to_string();
        let mut probation_status = BotProbationStatus::new(target.clone());
        probation_status.permanently_disabled = true;

        let accuracy = HashMap::new();
        let mut probation = HashMap::new();
        probation.insert(target, probation_status);

        let enabled = registry.enabled_bots(RegimeLabel::Bull, &accuracy, &probation);
        assert_eq!(enabled.len(), registry.all().len() - 1);
    }
}
