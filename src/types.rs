//! Core types for the Vitalflow derivation engine
//!
//! This module defines the data structures that flow through each derivation
//! stage: daily samples, the intake profile, baselines, anomaly alerts,
//! personal records, classifications, risk trajectories, and health scores.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metric kinds tracked by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Hrv,
    RestingHeartRate,
    DeepSleepMinutes,
    SleepEfficiency,
    RecoveryScore,
    Steps,
}

/// All metric kinds, in canonical order
pub const ALL_METRIC_KINDS: [MetricKind; 6] = [
    MetricKind::Hrv,
    MetricKind::RestingHeartRate,
    MetricKind::DeepSleepMinutes,
    MetricKind::SleepEfficiency,
    MetricKind::RecoveryScore,
    MetricKind::Steps,
];

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Hrv => "hrv",
            MetricKind::RestingHeartRate => "resting_heart_rate",
            MetricKind::DeepSleepMinutes => "deep_sleep_minutes",
            MetricKind::SleepEfficiency => "sleep_efficiency",
            MetricKind::RecoveryScore => "recovery_score",
            MetricKind::Steps => "steps",
        }
    }

    /// Whether a higher value is better for this metric.
    /// Resting heart rate is the one inverse metric.
    pub fn higher_is_better(&self) -> bool {
        !matches!(self, MetricKind::RestingHeartRate)
    }
}

/// One day's parsed metric values from a single source.
///
/// Produced by the external ingestion layer; all fields are optional since
/// devices report different subsets. Upsert key is `(date, source)` - a
/// re-upload for the same key replaces the prior sample wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySample {
    /// Date this sample represents
    pub date: NaiveDate,
    /// Source identifier (device or upload channel)
    pub source: String,
    /// Heart rate variability (ms, RMSSD)
    pub hrv_ms: Option<f64>,
    /// Resting heart rate (bpm)
    pub resting_hr_bpm: Option<f64>,
    /// Deep sleep duration (minutes)
    pub deep_sleep_minutes: Option<f64>,
    /// Sleep efficiency (percentage, 0-100)
    pub sleep_efficiency_pct: Option<f64>,
    /// Recovery score (percentage, 0-100)
    pub recovery_score_pct: Option<f64>,
    /// Step count
    pub steps: Option<f64>,
}

impl DailySample {
    /// Create an empty sample for a date and source
    pub fn new(date: NaiveDate, source: impl Into<String>) -> Self {
        Self {
            date,
            source: source.into(),
            hrv_ms: None,
            resting_hr_bpm: None,
            deep_sleep_minutes: None,
            sleep_efficiency_pct: None,
            recovery_score_pct: None,
            steps: None,
        }
    }

    /// Value for a metric kind, if present
    pub fn value(&self, kind: MetricKind) -> Option<f64> {
        match kind {
            MetricKind::Hrv => self.hrv_ms,
            MetricKind::RestingHeartRate => self.resting_hr_bpm,
            MetricKind::DeepSleepMinutes => self.deep_sleep_minutes,
            MetricKind::SleepEfficiency => self.sleep_efficiency_pct,
            MetricKind::RecoveryScore => self.recovery_score_pct,
            MetricKind::Steps => self.steps,
        }
    }

    /// Number of non-null metric values in this sample
    pub fn value_count(&self) -> usize {
        ALL_METRIC_KINDS
            .iter()
            .filter(|k| self.value(**k).is_some())
            .count()
    }
}

/// Biological sex as reported at onboarding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Other => "other",
        }
    }
}

/// User intake profile, supplied once at onboarding.
///
/// Read by the classifier and risk engine; mutated only by explicit user
/// update. Age-adjusted computations fail without it rather than assuming
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeProfile {
    /// Age in years (must be positive)
    pub age: u32,
    /// Biological sex
    pub sex: Sex,
    /// Diagnosed heart failure
    pub has_heart_failure: bool,
    /// Diagnosed diabetes
    pub has_diabetes: bool,
    /// Diagnosed chronic kidney disease
    pub has_chronic_kidney_disease: bool,
}

impl IntakeProfile {
    /// Validate profile invariants
    pub fn validate(&self) -> Result<(), crate::error::DeriveError> {
        if self.age == 0 {
            return Err(crate::error::DeriveError::InvalidProfile(
                "age must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rolling baseline statistics for one metric kind.
///
/// Overwritten wholesale on recalculation; there is no incremental merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBaseline {
    /// Metric this baseline describes
    pub metric: MetricKind,
    /// Arithmetic mean over the trailing window
    pub mean: f64,
    /// Population standard deviation over the trailing window
    pub std_deviation: f64,
    /// Number of samples the statistics were computed from
    pub sample_count: u32,
    /// When the baseline was computed
    pub calculated_at: DateTime<Utc>,
    /// When the baseline is next due for recalculation
    pub next_recalc_at: DateTime<Utc>,
}

/// Anomaly severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

/// Alert raised when a new sample deviates from its baseline.
///
/// Mutated only by the `seen` flag; never algorithmically deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyAlert {
    /// Alert identifier
    pub id: Uuid,
    /// Metric that deviated
    pub metric: MetricKind,
    /// The observed value
    pub detected_value: f64,
    /// Baseline mean the value was compared against
    pub baseline_value: f64,
    /// Signed deviation in standard-deviation units (z-score)
    pub deviation_amount: f64,
    /// Severity band
    pub severity: Severity,
    /// Whether the user has acknowledged the alert
    pub seen: bool,
    /// When the anomaly was detected
    pub detected_at: DateTime<Utc>,
}

/// Record scope. Only `AllTime` is computed; `Monthly` is a reserved
/// extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordScope {
    AllTime,
    Monthly,
}

/// Best-ever value for one metric.
///
/// Exactly one current record per (metric, scope); replaced only by a
/// strictly better value in the metric's direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalRecord {
    /// Metric the record is for
    pub metric: MetricKind,
    /// The record value
    pub record_value: f64,
    /// The value this record replaced, if any
    pub previous_record: Option<f64>,
    /// Date the record was achieved
    pub achieved_date: NaiveDate,
    /// Record scope
    pub scope: RecordScope,
}

/// A record replacement that occurred during a daily pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordUpdate {
    /// Metric that set a new record
    pub metric: MetricKind,
    /// The new record value
    pub new_value: f64,
    /// The displaced value, if a record previously existed
    pub previous_value: Option<f64>,
    /// Date the new record was achieved
    pub achieved_date: NaiveDate,
}

/// HRV classification tier, worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HrvTier {
    Low,
    Moderate,
    Favorable,
}

impl HrvTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            HrvTier::Low => "low",
            HrvTier::Moderate => "moderate",
            HrvTier::Favorable => "favorable",
        }
    }
}

/// Deep sleep classification tier, worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeepSleepTier {
    Inadequate,
    Borderline,
    Adequate,
}

impl DeepSleepTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeepSleepTier::Inadequate => "inadequate",
            DeepSleepTier::Borderline => "borderline",
            DeepSleepTier::Adequate => "adequate",
        }
    }
}

/// Age-adjusted assessment of one metric average
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricAssessment<T> {
    /// The window-average value that was assessed
    pub value: f64,
    /// Qualitative tier
    pub tier: T,
    /// Estimated relative standing against the age-banded reference
    /// population (0-100)
    pub percentile: f64,
    /// Whether an age-adjusted reference target was applied
    pub age_adjusted: bool,
}

/// Derived physiological classification bundle.
///
/// Not persisted independently; recomputed on demand from window averages
/// and the intake profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysiologicalClassification {
    pub hrv: MetricAssessment<HrvTier>,
    pub deep_sleep: MetricAssessment<DeepSleepTier>,
}

/// Disease condition modeled by the risk engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Dementia,
    Cardiovascular,
    HeartFailure,
    CognitiveDecline,
    Metabolic,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Dementia => "dementia",
            Condition::Cardiovascular => "cardiovascular",
            Condition::HeartFailure => "heart_failure",
            Condition::CognitiveDecline => "cognitive_decline",
            Condition::Metabolic => "metabolic",
        }
    }
}

/// Qualitative risk band derived from projected risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    Elevated,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::Elevated => "elevated",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// Trajectory trend. A single snapshot never reports `Improving`;
/// improvement is only observable by comparing two runs over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Worsening,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Stable => "stable",
            Trend::Worsening => "worsening",
        }
    }
}

/// Projected risk for one condition at present and four forward horizons.
///
/// All values are percentages in [0, 100] and monotonic across horizons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskTrajectory {
    /// Condition this trajectory describes
    pub condition: Condition,
    /// Current risk
    pub current: f64,
    /// Projected risk at six months
    pub six_months: f64,
    /// Projected risk at one year
    pub one_year: f64,
    /// Projected risk at five years
    pub five_years: f64,
    /// Projected risk at ten years
    pub ten_years: f64,
    /// Qualitative band
    pub risk_level: RiskLevel,
    /// Up to three human-readable driver strings, in insertion order
    pub primary_drivers: Vec<String>,
    /// Snapshot trend
    pub trend: Trend,
}

/// The five condition trajectories produced by one risk computation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskBundle {
    pub dementia: RiskTrajectory,
    pub cardiovascular: RiskTrajectory,
    pub heart_failure: RiskTrajectory,
    pub cognitive_decline: RiskTrajectory,
    pub metabolic: RiskTrajectory,
}

impl RiskBundle {
    /// All five trajectories in stable canonical order
    pub fn iter(&self) -> impl Iterator<Item = &RiskTrajectory> {
        [
            &self.dementia,
            &self.cardiovascular,
            &self.heart_failure,
            &self.cognitive_decline,
            &self.metabolic,
        ]
        .into_iter()
    }

    /// The two most urgent conditions, ranked by five-year risk descending.
    /// Ties break by canonical order (the sort is stable).
    pub fn top_concerns(&self) -> [Condition; 2] {
        let mut ranked: Vec<&RiskTrajectory> = self.iter().collect();
        ranked.sort_by(|a, b| {
            b.five_years
                .partial_cmp(&a.five_years)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        [ranked[0].condition, ranked[1].condition]
    }
}

/// One weighted component of the daily health score
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ComponentScore {
    /// Component score (0-100)
    pub score: f64,
    /// Weight in the composite (0-1)
    pub weight: f64,
}

/// Composite daily health score with per-component breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthScore {
    /// Date the score applies to
    pub date: NaiveDate,
    /// Weighted composite (0-100)
    pub overall_score: f64,
    pub hrv: ComponentScore,
    pub sleep: ComponentScore,
    pub recovery: ComponentScore,
    pub activity: ComponentScore,
    /// Explanation of the weight allocation
    pub reasoning: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_direction() {
        assert!(MetricKind::Hrv.higher_is_better());
        assert!(MetricKind::Steps.higher_is_better());
        assert!(!MetricKind::RestingHeartRate.higher_is_better());
    }

    #[test]
    fn test_sample_value_accessor() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut sample = DailySample::new(date, "whoop");
        sample.hrv_ms = Some(62.0);
        sample.steps = Some(9500.0);

        assert_eq!(sample.value(MetricKind::Hrv), Some(62.0));
        assert_eq!(sample.value(MetricKind::DeepSleepMinutes), None);
        assert_eq!(sample.value_count(), 2);
    }

    #[test]
    fn test_profile_validation() {
        let profile = IntakeProfile {
            age: 0,
            sex: Sex::Female,
            has_heart_failure: false,
            has_diabetes: false,
            has_chronic_kidney_disease: false,
        };
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_tier_ordering() {
        assert!(HrvTier::Low < HrvTier::Moderate);
        assert!(HrvTier::Moderate < HrvTier::Favorable);
        assert!(DeepSleepTier::Inadequate < DeepSleepTier::Adequate);
    }

    #[test]
    fn test_enum_wire_format() {
        let json = serde_json::to_string(&MetricKind::DeepSleepMinutes).unwrap();
        assert_eq!(json, "\"deep_sleep_minutes\"");
        let json = serde_json::to_string(&RiskLevel::Elevated).unwrap();
        assert_eq!(json, "\"elevated\"");
    }
}
