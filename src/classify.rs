//! Physiological classification
//!
//! This module buckets window-average HRV and deep sleep into qualitative
//! tiers against age-adjusted reference targets, with a percentile estimate
//! of relative standing.

use crate::error::DeriveError;
use crate::reference::{deep_sleep_target_for_age, hrv_target_for_age, percentile_estimate};
use crate::types::{
    DeepSleepTier, HrvTier, IntakeProfile, MetricAssessment, PhysiologicalClassification,
};

/// Fraction of the HRV target below which the tier drops from Moderate to Low
pub const HRV_MODERATE_FLOOR: f64 = 0.7;

/// Fraction of the deep sleep target below which the tier drops from
/// Borderline to Inadequate
pub const DEEP_SLEEP_BORDERLINE_FLOOR: f64 = 0.75;

/// Classify an HRV average against the age target
pub fn classify_hrv(avg_hrv_ms: f64, age: u32) -> MetricAssessment<HrvTier> {
    let target = hrv_target_for_age(age);
    let tier = if avg_hrv_ms >= target {
        HrvTier::Favorable
    } else if avg_hrv_ms >= target * HRV_MODERATE_FLOOR {
        HrvTier::Moderate
    } else {
        HrvTier::Low
    };
    MetricAssessment {
        value: avg_hrv_ms,
        tier,
        percentile: percentile_estimate(avg_hrv_ms, target),
        age_adjusted: true,
    }
}

/// Classify a deep sleep average against the age target
pub fn classify_deep_sleep(avg_deep_sleep_min: f64, age: u32) -> MetricAssessment<DeepSleepTier> {
    let target = deep_sleep_target_for_age(age);
    let tier = if avg_deep_sleep_min >= target {
        DeepSleepTier::Adequate
    } else if avg_deep_sleep_min >= target * DEEP_SLEEP_BORDERLINE_FLOOR {
        DeepSleepTier::Borderline
    } else {
        DeepSleepTier::Inadequate
    };
    MetricAssessment {
        value: avg_deep_sleep_min,
        tier,
        percentile: percentile_estimate(avg_deep_sleep_min, target),
        age_adjusted: true,
    }
}

/// Classify both HRV and deep sleep averages for a profile.
///
/// Errors when the profile is absent - age-adjusted classification with a
/// defaulted age would be clinically misleading.
pub fn classify(
    avg_hrv_ms: f64,
    avg_deep_sleep_min: f64,
    profile: Option<&IntakeProfile>,
) -> Result<PhysiologicalClassification, DeriveError> {
    let profile = profile.ok_or_else(|| {
        DeriveError::MissingIntakeData("physiological classification".to_string())
    })?;
    profile.validate()?;

    Ok(PhysiologicalClassification {
        hrv: classify_hrv(avg_hrv_ms, profile.age),
        deep_sleep: classify_deep_sleep(avg_deep_sleep_min, profile.age),
    })
}
