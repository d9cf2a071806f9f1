// =============================================================================
// Scheduler (C9)
// =============================================================================
//
// Drives every recurring job off `RuntimeConfig`'s cadence keys: per-profile
// scan cron strings, the outcome tracker's price-sample and horizon-check
// intervals, the accuracy rollup interval, and the daily weight-adjustment
// cron. Grounded on the teacher's `daemon.rs`-style "wake up, do the thing,
// sleep again" loop shape, generalized here to a minute-granularity cron
// matcher so several independently-configured cadences can share one clock
// instead of one hardcoded `tokio::time::interval` per job.
//
// Each job is single-flight: a cron tick while the previous firing of that
// same job is still running is simply skipped rather than queued, so a slow
// scan never stacks up overlapping runs of itself. There is no catch-up for
// missed ticks (a tick while the process was down, or while a prior run was
// still in flight, is gone for good) — that mirrors standard cron semantics.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Timelike, Utc};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::RuntimeConfig;
use crate::orchestrator::ScanOrchestrator;
use crate::outcome::OutcomeTracker;
use crate::types::{FilterScope, ScanSpec};
use crate::weighting::AdaptiveWeighting;

const TICK_INTERVAL: Duration = Duration::from_secs(60);

/// A parsed 5-field cron expression (`minute hour day-of-month month
/// day-of-week`), evaluated once per minute against UTC time. Supports `*`,
/// `*/N` step expressions, and comma-separated lists of either — enough to
/// express every cadence `config.rs`'s defaults use, without pulling in a
/// full cron-parsing dependency the codebase never otherwise needed.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    minute: Field,
    hour: Field,
    day_of_month: Field,
    month: Field,
    day_of_week: Field,
}

#[derive(Debug, Clone)]
enum Field {
    Any,
    Values(Vec<u32>),
}

impl Field {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        if raw == "*" {
            return Ok(Field::Any);
        }
        let mut values = Vec::new();
        for part in raw.split(',') {
            if let Some(step_spec) = part.strip_prefix("*/") {
                let step: u32 = step_spec.parse()?;
                anyhow::ensure!(step > 0, "cron step must be positive: {raw}");
                let mut v = 0;
                while v < 60 {
                    values.push(v);
                    v += step;
                }
            } else {
                values.push(part.parse()?);
            }
        }
        Ok(Field::Values(values))
    }

    fn matches(&self, value: u32) -> bool {
        match self {
            Field::Any => true,
            Field::Values(values) => values.contains(&value),
        }
    }
}

impl CronSchedule {
    pub fn parse(expr: &str) -> anyhow::Result<Self> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        anyhow::ensure!(fields.len() == 5, "cron expression must have 5 fields, got {}: {expr}", fields.len());
        Ok(Self {
            minute: Field::parse(fields[0])?,
            hour: Field::parse(fields[1])?,
            day_of_month: Field::parse(fields[2])?,
            month: Field::parse(fields[3])?,
            day_of_week: Field::parse(fields[4])?,
        })
    }

    fn matches(&self, now: chrono::DateTime<Utc>) -> bool {
        self.minute.matches(now.minute())
            && self.hour.matches(now.hour())
            && self.day_of_month.matches(now.day())
            && self.month.matches(now.month())
            && self.day_of_week.matches(now.weekday().num_days_from_sunday())
    }
}

pub struct Scheduler {
    orchestrator: Arc<ScanOrchestrator>,
    outcome_tracker: Arc<OutcomeTracker>,
    weighting: Arc<AdaptiveWeighting>,
    config: Arc<RwLock<RuntimeConfig>>,
}

impl Scheduler {
    pub fn new(
        orchestrator: Arc<ScanOrchestrator>,
        outcome_tracker: Arc<OutcomeTracker>,
        weighting: Arc<AdaptiveWeighting>,
        config: Arc<RwLock<RuntimeConfig>>,
    ) -> Self {
        Self { orchestrator, outcome_tracker, weighting, config }
    }

    /// Spawns one task per cadence and returns immediately; the tasks run
    /// for the lifetime of the process.
    pub fn spawn(self: Arc<Self>) {
        self.clone().spawn_scan_cron();
        self.clone().spawn_outcome_loop();
        self.clone().spawn_rollup_loop();
        self.spawn_weight_adjustment_cron();
    }

    fn spawn_scan_cron(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut locks: HashMap<String, Arc<Mutex<()>>> = HashMap::new();
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            loop {
                interval.tick().await;
                let now = Utc::now();
                let profiles: Vec<(String, String)> = self
                    .config
                    .read()
                    .scan_cron
                    .iter()
                    .map(|(scan_type, cron)| (scan_type.clone(), cron.clone()))
                    .collect();

                for (scan_type, cron_expr) in profiles {
                    let schedule = match CronSchedule::parse(&cron_expr) {
                        Ok(s) => s,
                        Err(e) => {
                            error!(scan_type, cron = cron_expr, error = %e, "invalid scan cron expression");
                            continue;
                        }
                    };
                    if !schedule.matches(now) {
                        continue;
                    }

                    let lock = locks.entry(scan_type.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone();
                    let Ok(guard) = lock.try_lock_owned() else {
                        warn!(scan_type, "scan cron tick skipped, previous firing still dispatching");
                        continue;
                    };

                    let Some(spec) = self.spec_for_profile(&scan_type) else {
                        warn!(scan_type, "scan cron fired for unknown profile, skipping");
                        continue;
                    };

                    let orchestrator = self.orchestrator.clone();
                    let scan_type_for_log = scan_type.clone();
                    tokio::spawn(async move {
                        let run_id = orchestrator.start_scan(spec).await;
                        info!(scan_type = %scan_type_for_log, run_id = %run_id, "cron-triggered scan dispatched");
                        drop(guard);
                    });
                }
            }
        });
    }

    fn spec_for_profile(&self, scan_type: &str) -> Option<ScanSpec> {
        let config = self.config.read();
        let profile = config.scan_profiles.get(scan_type)?;
        Some(ScanSpec {
            scan_type: scan_type.to_string(),
            filter_scope: FilterScope::All,
            min_price: None,
            max_price: None,
            coin_limit: profile.coin_limit,
            confidence_threshold: 6.0,
            use_deep_ai: profile.use_llm,
        })
    }

    fn spawn_outcome_loop(self: Arc<Self>) {
        tokio::spawn(async move {
            loop {
                let interval_secs = self.config.read().outcome_horizon_check_interval_secs;
                tokio::time::sleep(Duration::from_secs(interval_secs)).await;
                if let Err(e) = self.outcome_tracker.run_once().await {
                    error!(error = %e, "outcome tracker pass failed");
                }
            }
        });
    }

    fn spawn_rollup_loop(self: Arc<Self>) {
        tokio::spawn(async move {
            loop {
                let interval_secs = self.config.read().metrics_rollup_interval_secs;
                tokio::time::sleep(Duration::from_secs(interval_secs)).await;
                if let Err(e) = self.weighting.run_rollup().await {
                    error!(error = %e, "accuracy rollup pass failed");
                }
            }
        });
    }

    fn spawn_weight_adjustment_cron(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            let mut last_fired_minute: Option<chrono::DateTime<Utc>> = None;
            loop {
                interval.tick().await;
                let now = Utc::now();
                let cron_expr = self.config.read().weight_adjustment_cron.clone();
                let schedule = match CronSchedule::parse(&cron_expr) {
                    Ok(s) => s,
                    Err(e) => {
                        error!(cron = cron_expr, error = %e, "invalid weight adjustment cron expression");
                        continue;
                    }
                };

                if !schedule.matches(now) {
                    continue;
                }
                // A cron match holds for the whole minute; only fire once per
                // distinct minute boundary.
                if last_fired_minute.map(|t| t.minute() == now.minute() && t.hour() == now.hour()).unwrap_or(false) {
                    continue;
                }
                last_fired_minute = Some(now);

                if let Err(e) = self.weighting.run_daily_adjustment().await {
                    error!(error = %e, "weight adjustment pass failed");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_schedule_matches_everything() {
        let schedule = CronSchedule::parse("* * * * *").unwrap();
        assert!(schedule.matches(Utc::now()));
    }

    #[test]
    fn step_field_matches_only_multiples() {
        let schedule = CronSchedule::parse("*/30 * * * *").unwrap();
        let minute_0 = Utc::now().with_minute(0).unwrap();
        let minute_15 = Utc::now().with_minute(15).unwrap();
        assert!(schedule.matches(minute_0));
        assert!(!schedule.matches(minute_15));
    }

    #[test]
    fn hour_step_matches_every_fourth_hour() {
        let schedule = CronSchedule::parse("0 */4 * * *").unwrap();
        let at_zero = Utc::now().with_minute(0).unwrap().with_hour(0).unwrap();
        let at_four = Utc::now().with_minute(0).unwrap().with_hour(4).unwrap();
        let at_five = Utc::now().with_minute(0).unwrap().with_hour(5).unwrap();
        assert!(schedule.matches(at_zero));
        assert!(schedule.matches(at_four));
        assert!(!schedule.matches(at_five));
    }

    #[test]
    fn rejects_expressions_with_wrong_field_count() {
        assert!(CronSchedule::parse("* * *").is_err());
    }

    #[test]
    fn single_value_field_matches_exact_hour() {
        let schedule = CronSchedule::parse("0 5 * * *").unwrap();
        let at_five = Utc::now().with_minute(0).unwrap().with_hour(5).unwrap();
        let at_six = Utc::now().with_minute(0).unwrap().with_hour(6).unwrap();
        assert!(schedule.matches(at_five));
        assert!(!schedule.matches(at_six));
    }
}
