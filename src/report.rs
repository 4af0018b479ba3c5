//! Daily report encoding
//!
//! This module assembles the serializable daily report consumed by the
//! external narrative generator: the day's outcome, the classification and
//! risk bundle when an intake profile is available, and producer metadata
//! for provenance.

use crate::error::DeriveError;
use crate::pipeline::{DayOutcome, SignalEngine, WindowAverages};
use crate::types::{HealthScore, PhysiologicalClassification, RiskBundle};
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Producer metadata embedded in every report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// One day's derived signals, packaged for downstream consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyReport {
    pub producer: ReportProducer,
    /// When the report was assembled
    pub computed_at_utc: String,
    /// Date the report covers
    pub date: NaiveDate,
    /// Ingestion outcome for the day
    pub outcome: DayOutcome,
    /// Window averages behind the classification
    pub averages: WindowAverages,
    /// Present when an intake profile is set and the window has data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<PhysiologicalClassification>,
    /// Present when classification is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskBundle>,
    /// The day's composite score, if one was recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_score: Option<HealthScore>,
}

/// Report encoder with a stable per-process instance identity
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Assemble a report for one ingested day.
    ///
    /// Classification and risk are included when the engine can compute
    /// them; a missing profile or an empty window leaves them out rather
    /// than failing the report.
    pub fn encode(&self, engine: &SignalEngine, date: NaiveDate, outcome: DayOutcome)
        -> DailyReport {
        let classification = engine.classification().ok();
        let risk = classification
            .as_ref()
            .and_then(|_| engine.risk_trajectories().ok());

        DailyReport {
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            date,
            outcome,
            averages: engine.window_averages(),
            classification,
            risk,
            health_score: engine.health_score(date).cloned(),
        }
    }

    /// Encode a report to pretty JSON
    pub fn encode_to_json(
        &self,
        engine: &SignalEngine,
        date: NaiveDate,
        outcome: DayOutcome,
    ) -> Result<String, DeriveError> {
        let report = self.encode(engine, date, outcome);
        serde_json::to_string_pretty(&report).map_err(DeriveError::JsonError)
    }
}
