//! Baseline estimation
//!
//! This module computes rolling per-metric baselines (mean and population
//! standard deviation) from a trailing sample window. Baselines give anomaly
//! detection its "normal" reference and are recalculated on a fixed cadence.

use crate::types::{DailySample, MetricKind, UserBaseline, ALL_METRIC_KINDS};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trailing window over which baselines are computed (days)
pub const BASELINE_WINDOW_DAYS: i64 = 14;

/// Minimum non-null values across all metric kinds before a pass is attempted
pub const MIN_TOTAL_SAMPLES: usize = 7;

/// Minimum non-null values for one metric kind before its baseline persists
pub const MIN_METRIC_SAMPLES: usize = 5;

/// Recalculation interval (days)
pub const RECALC_INTERVAL_DAYS: i64 = 30;

/// Compute baselines for every metric kind with enough data in the window.
///
/// Returns an empty vector (a no-op, not an error) when fewer than
/// [`MIN_TOTAL_SAMPLES`] non-null values exist across all kinds in the
/// trailing window ending at `as_of`. Kinds with fewer than
/// [`MIN_METRIC_SAMPLES`] values are skipped.
pub fn compute_baselines(
    samples: &[DailySample],
    as_of: NaiveDate,
    now: DateTime<Utc>,
) -> Vec<UserBaseline> {
    let window_start = as_of - Duration::days(BASELINE_WINDOW_DAYS - 1);
    let windowed: Vec<&DailySample> = samples
        .iter()
        .filter(|s| s.date >= window_start && s.date <= as_of)
        .collect();

    let total_values: usize = windowed.iter().map(|s| s.value_count()).sum();
    if total_values < MIN_TOTAL_SAMPLES {
        return Vec::new();
    }

    let mut baselines = Vec::new();
    for kind in ALL_METRIC_KINDS {
        let values: Vec<f64> = windowed.iter().filter_map(|s| s.value(kind)).collect();
        if values.len() < MIN_METRIC_SAMPLES {
            continue;
        }
        let (mean, std_deviation) = population_stats(&values);
        baselines.push(UserBaseline {
            metric: kind,
            mean,
            std_deviation,
            sample_count: values.len() as u32,
            calculated_at: now,
            next_recalc_at: now + Duration::days(RECALC_INTERVAL_DAYS),
        });
    }
    baselines
}

/// Arithmetic mean and population standard deviation (divide by n, not n-1)
fn population_stats(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Current baselines for one user, keyed by metric kind.
///
/// Rows are replaced wholesale by each recalculation pass; kinds that no
/// longer qualify keep their previous row until the next qualifying pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaselineSet {
    baselines: BTreeMap<MetricKind, UserBaseline>,
}

impl BaselineSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Baseline for a metric kind, if one has been computed
    pub fn get(&self, kind: MetricKind) -> Option<&UserBaseline> {
        self.baselines.get(&kind)
    }

    /// Number of metric kinds with a current baseline
    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }

    /// Whether a recalculation pass is due at `now`.
    ///
    /// Due when no baselines exist yet, or when any row has reached its
    /// `next_recalc_at`.
    pub fn recalc_due(&self, now: DateTime<Utc>) -> bool {
        if self.baselines.is_empty() {
            return true;
        }
        self.baselines.values().any(|b| now >= b.next_recalc_at)
    }

    /// Run a recalculation pass over the sample window, upserting every
    /// qualifying metric kind. Returns true if any row was written.
    pub fn recalculate(
        &mut self,
        samples: &[DailySample],
        as_of: NaiveDate,
        now: DateTime<Utc>,
    ) -> bool {
        let computed = compute_baselines(samples, as_of, now);
        if computed.is_empty() {
            return false;
        }
        for baseline in computed {
            self.baselines.insert(baseline.metric, baseline);
        }
        true
    }

    /// Load from a JSON snapshot
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to a JSON snapshot
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
