//! Engine orchestration
//!
//! This module provides the public API for Vitalflow: a stateful engine that
//! accepts daily samples and runs them through baseline estimation, anomaly
//! detection, and record tracking, with classification and risk trajectories
//! computed on demand.
//!
//! Ordering guarantee: a baseline pass runs (or has previously run) before
//! anomaly detection consumes it for the same day's sample. When no baseline
//! exists for a metric, detection is skipped, never blocked.

use crate::anomaly::{self, AnomalyConfig};
use crate::baseline::{BaselineSet, BASELINE_WINDOW_DAYS};
use crate::classify;
use crate::error::DeriveError;
use crate::records::RecordBook;
use crate::risk::{self, RiskInputs};
use crate::types::{
    AnomalyAlert, DailySample, HealthScore, IntakeProfile, MetricKind,
    PhysiologicalClassification, RecordUpdate, RiskBundle, ALL_METRIC_KINDS,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Everything that happened while ingesting one day's sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayOutcome {
    /// Alerts raised by anomaly detection this cycle
    pub alerts: Vec<AnomalyAlert>,
    /// Records set this cycle
    pub record_updates: Vec<RecordUpdate>,
    /// Whether a baseline recalculation pass wrote any rows
    pub baselines_refreshed: bool,
}

/// Window averages used by classification and risk projection
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WindowAverages {
    pub hrv_ms: Option<f64>,
    pub deep_sleep_minutes: Option<f64>,
}

/// Stateful derivation engine for one user.
///
/// Holds the trailing sample window, baselines, records, alerts, and daily
/// health scores. All state serializes to JSON so a host can persist it
/// between runs; real storage is an external collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalEngine {
    samples: Vec<DailySample>,
    baselines: BaselineSet,
    records: RecordBook,
    alerts: Vec<AnomalyAlert>,
    scores: BTreeMap<NaiveDate, HealthScore>,
    profile: Option<IntakeProfile>,
    anomaly_config: AnomalyConfig,
}

impl SignalEngine {
    /// Create an engine with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with specific anomaly severity bands
    pub fn with_anomaly_config(config: AnomalyConfig) -> Self {
        Self {
            anomaly_config: config,
            ..Self::default()
        }
    }

    /// Set or replace the intake profile
    pub fn set_profile(&mut self, profile: IntakeProfile) -> Result<(), DeriveError> {
        profile.validate()?;
        self.profile = Some(profile);
        Ok(())
    }

    pub fn profile(&self) -> Option<&IntakeProfile> {
        self.profile.as_ref()
    }

    /// Ingest one day's sample.
    ///
    /// Upserts by `(date, source)`, runs a baseline recalculation when due,
    /// then anomaly detection, then record tracking. Baseline and record
    /// passes touch disjoint state and could run in either order; anomaly
    /// detection always follows the baseline pass.
    pub fn ingest(&mut self, sample: DailySample) -> DayOutcome {
        self.ingest_at(sample, Utc::now())
    }

    /// [`ingest`](Self::ingest) with an explicit clock, for deterministic
    /// recalculation cadence
    pub fn ingest_at(&mut self, sample: DailySample, now: DateTime<Utc>) -> DayOutcome {
        self.upsert_sample(sample.clone());

        let mut baselines_refreshed = false;
        if self.baselines.recalc_due(now) {
            if let Some(as_of) = self.latest_date() {
                baselines_refreshed = self.baselines.recalculate(&self.samples, as_of, now);
            }
        }

        let mut alerts = Vec::new();
        for kind in ALL_METRIC_KINDS {
            let (Some(value), Some(baseline)) = (sample.value(kind), self.baselines.get(kind))
            else {
                continue;
            };
            if let Some(alert) = anomaly::detect(value, baseline, &self.anomaly_config, now) {
                alerts.push(alert);
            }
        }
        self.alerts.extend(alerts.iter().cloned());

        let record_updates = self.records.apply_day(&sample);

        DayOutcome {
            alerts,
            record_updates,
            baselines_refreshed,
        }
    }

    fn upsert_sample(&mut self, sample: DailySample) {
        match self
            .samples
            .iter_mut()
            .find(|s| s.date == sample.date && s.source == sample.source)
        {
            Some(existing) => *existing = sample,
            None => self.samples.push(sample),
        }
    }

    fn latest_date(&self) -> Option<NaiveDate> {
        self.samples.iter().map(|s| s.date).max()
    }

    /// Samples currently held by the engine
    pub fn samples(&self) -> &[DailySample] {
        &self.samples
    }

    /// Current baselines
    pub fn baselines(&self) -> &BaselineSet {
        &self.baselines
    }

    /// Current records
    pub fn records(&self) -> &RecordBook {
        &self.records
    }

    /// Every alert raised so far, oldest first
    pub fn alerts(&self) -> &[AnomalyAlert] {
        &self.alerts
    }

    /// Mark an alert as acknowledged. The `seen` flag is the only permitted
    /// alert mutation.
    pub fn mark_alert_seen(&mut self, id: Uuid) -> Result<(), DeriveError> {
        match self.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.seen = true;
                Ok(())
            }
            None => Err(DeriveError::UnknownAlert(id.to_string())),
        }
    }

    /// Average HRV and deep sleep over the trailing window ending at the
    /// most recent sample date
    pub fn window_averages(&self) -> WindowAverages {
        let Some(latest) = self.latest_date() else {
            return WindowAverages {
                hrv_ms: None,
                deep_sleep_minutes: None,
            };
        };
        let window_start = latest - Duration::days(BASELINE_WINDOW_DAYS - 1);
        let windowed: Vec<&DailySample> = self
            .samples
            .iter()
            .filter(|s| s.date >= window_start && s.date <= latest)
            .collect();

        WindowAverages {
            hrv_ms: average_of(&windowed, MetricKind::Hrv),
            deep_sleep_minutes: average_of(&windowed, MetricKind::DeepSleepMinutes),
        }
    }

    /// Age-adjusted classification of the window averages.
    ///
    /// Errors when the intake profile is missing or either average has no
    /// data in the window.
    pub fn classification(&self) -> Result<PhysiologicalClassification, DeriveError> {
        let averages = self.window_averages();
        let hrv = averages.hrv_ms.ok_or_else(|| {
            DeriveError::InsufficientData("no HRV values in window".to_string())
        })?;
        let deep_sleep = averages.deep_sleep_minutes.ok_or_else(|| {
            DeriveError::InsufficientData("no deep sleep values in window".to_string())
        })?;
        classify::classify(hrv, deep_sleep, self.profile.as_ref())
    }

    /// Five-condition risk trajectories for the current snapshot
    pub fn risk_trajectories(&self) -> Result<RiskBundle, DeriveError> {
        let profile = self.profile.as_ref().ok_or_else(|| {
            DeriveError::MissingIntakeData("risk projection".to_string())
        })?;
        let classification = self.classification()?;
        let averages = self.window_averages();

        // classification() succeeded, so both averages are present
        Ok(risk::compute_bundle(&RiskInputs {
            avg_hrv_ms: averages.hrv_ms.unwrap_or_default(),
            avg_deep_sleep_min: averages.deep_sleep_minutes.unwrap_or_default(),
            classification: &classification,
            profile,
        }))
    }

    /// Record a day's composite health score, replacing any prior score for
    /// that date
    pub fn upsert_health_score(&mut self, score: HealthScore) {
        self.scores.insert(score.date, score);
    }

    /// The health score recorded for a date, if any
    pub fn health_score(&self, date: NaiveDate) -> Option<&HealthScore> {
        self.scores.get(&date)
    }

    /// Load engine state from a JSON snapshot
    pub fn from_json(json: &str) -> Result<Self, DeriveError> {
        serde_json::from_str(json).map_err(|e| DeriveError::StateError(e.to_string()))
    }

    /// Serialize engine state to a JSON snapshot
    pub fn to_json(&self) -> Result<String, DeriveError> {
        serde_json::to_string(self).map_err(|e| DeriveError::StateError(e.to_string()))
    }
}

fn average_of(samples: &[&DailySample], kind: MetricKind) -> Option<f64> {
    let values: Vec<f64> = samples.iter().filter_map(|s| s.value(kind)).collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
