//! Vitalflow - On-device derivation engine for wearable health signals
//!
//! Vitalflow turns clean daily biometric samples into four classes of
//! signal: composite daily health scores, statistical anomaly alerts against
//! a personal baseline, personal-best records, and multi-year risk
//! trajectories across five conditions.
//!
//! ## Modules
//!
//! - **Baseline**: rolling per-metric mean and deviation over a trailing window
//! - **Anomaly**: z-score severity classification of new readings
//! - **Records**: best-ever value tracking with per-metric direction
//! - **Classify / Risk**: age-adjusted physiological tiers feeding five
//!   parameterized disease-risk models
//! - **Pipeline**: the stateful [`SignalEngine`] orchestrating all of the above

pub mod anomaly;
pub mod baseline;
pub mod classify;
pub mod error;
pub mod pipeline;
pub mod records;
pub mod reference;
pub mod report;
pub mod risk;
pub mod score;
pub mod types;

pub use error::DeriveError;
pub use pipeline::{DayOutcome, SignalEngine, WindowAverages};
pub use report::{DailyReport, ReportEncoder};
pub use types::{
    AnomalyAlert, Condition, DailySample, HealthScore, IntakeProfile, MetricKind,
    PersonalRecord, PhysiologicalClassification, RiskBundle, RiskTrajectory,
};

/// Engine version embedded in all report payloads
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "vitalflow";
