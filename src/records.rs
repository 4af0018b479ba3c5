//! Personal record tracking
//!
//! This module maintains the best-ever value per metric. A record is
//! replaced only by a strictly better value in the metric's direction
//! (higher for most metrics, lower for resting heart rate).

use crate::types::{DailySample, MetricKind, PersonalRecord, RecordScope, RecordUpdate,
    ALL_METRIC_KINDS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All-time records for one user, keyed by metric kind.
///
/// Only the `AllTime` scope is computed; `Monthly` is a reserved extension
/// point in [`RecordScope`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordBook {
    records: BTreeMap<MetricKind, PersonalRecord>,
}

impl RecordBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record for a metric, if any
    pub fn get(&self, kind: MetricKind) -> Option<&PersonalRecord> {
        self.records.get(&kind)
    }

    /// Number of metrics holding a record
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Submit one value for record consideration.
    ///
    /// Read-compare-write against the current record within this `&mut`
    /// critical section; the persistence layer's transactional upsert is
    /// expected to provide the same at-most-one-winner guarantee across
    /// processes.
    pub fn submit(&mut self, kind: MetricKind, value: f64, sample: &DailySample)
        -> Option<RecordUpdate> {
        let current = self.records.get(&kind);
        let is_new_record = match current {
            None => true,
            Some(existing) => {
                if kind.higher_is_better() {
                    value > existing.record_value
                } else {
                    value < existing.record_value
                }
            }
        };
        if !is_new_record {
            return None;
        }

        let previous = current.map(|r| r.record_value);
        self.records.insert(
            kind,
            PersonalRecord {
                metric: kind,
                record_value: value,
                previous_record: previous,
                achieved_date: sample.date,
                scope: RecordScope::AllTime,
            },
        );
        Some(RecordUpdate {
            metric: kind,
            new_value: value,
            previous_value: previous,
            achieved_date: sample.date,
        })
    }

    /// Run a fresh day's values through record consideration.
    ///
    /// Returns the metrics that set a new record this pass, in canonical
    /// metric order.
    pub fn apply_day(&mut self, sample: &DailySample) -> Vec<RecordUpdate> {
        let mut updates = Vec::new();
        for kind in ALL_METRIC_KINDS {
            if let Some(value) = sample.value(kind) {
                if let Some(update) = self.submit(kind, value, sample) {
                    updates.push(update);
                }
            }
        }
        updates
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
