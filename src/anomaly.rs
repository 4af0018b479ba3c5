//! Anomaly detection
//!
//! This module compares a new metric value against its personal baseline and
//! classifies the deviation severity in standard-deviation units.

use crate::types::{AnomalyAlert, Severity, UserBaseline};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default z-score magnitude at which a deviation becomes a warning
pub const DEFAULT_WARNING_Z: f64 = 2.0;

/// Default z-score magnitude at which a deviation becomes critical
pub const DEFAULT_CRITICAL_Z: f64 = 3.0;

/// Severity band configuration.
///
/// The production thresholds are not clinically fixed; these defaults are
/// tunable per deployment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// |z| at or above which a deviation is a warning
    pub warning_z: f64,
    /// |z| at or above which a deviation is critical
    pub critical_z: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            warning_z: DEFAULT_WARNING_Z,
            critical_z: DEFAULT_CRITICAL_Z,
        }
    }
}

impl AnomalyConfig {
    /// Classify a z-score magnitude into a severity band, if anomalous
    pub fn classify(&self, z: f64) -> Option<Severity> {
        let magnitude = z.abs();
        if magnitude >= self.critical_z {
            Some(Severity::Critical)
        } else if magnitude >= self.warning_z {
            Some(Severity::Warning)
        } else {
            None
        }
    }
}

/// Evaluate one new value against its baseline.
///
/// Returns `None` when the deviation is inside the warning band, and also
/// when the baseline has zero variance - a constant-reading baseline cannot
/// produce a meaningful z-score, so detection is skipped rather than
/// dividing by zero.
pub fn detect(
    value: f64,
    baseline: &UserBaseline,
    config: &AnomalyConfig,
    detected_at: DateTime<Utc>,
) -> Option<AnomalyAlert> {
    if baseline.std_deviation == 0.0 {
        return None;
    }

    let z = (value - baseline.mean) / baseline.std_deviation;
    let severity = config.classify(z)?;

    Some(AnomalyAlert {
        id: Uuid::new_v4(),
        metric: baseline.metric,
        detected_value: value,
        baseline_value: baseline.mean,
        deviation_amount: z,
        severity,
        seen: false,
        detected_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetricKind;
    use chrono::Duration;

    fn make_baseline(mean: f64, std: f64) -> UserBaseline {
        let now = Utc::now();
        UserBaseline {
            metric: MetricKind::Hrv,
            mean,
            std_deviation: std,
            sample_count: 10,
            calculated_at: now,
            next_recalc_at: now + Duration::days(30),
        }
    }

    #[test]
    fn test_z_three_point_five_is_critical() {
        let baseline = make_baseline(50.0, 10.0);
        let alert = detect(85.0, &baseline, &AnomalyConfig::default(), Utc::now())
            .expect("anomaly expected");
        assert!((alert.deviation_amount - 3.5).abs() < 1e-9);
        assert_eq!(alert.severity, Severity::Critical);
        assert!(!alert.seen);
    }

    #[test]
    fn test_warning_band() {
        let baseline = make_baseline(50.0, 10.0);
        let alert = detect(75.0, &baseline, &AnomalyConfig::default(), Utc::now())
            .expect("anomaly expected");
        assert_eq!(alert.severity, Severity::Warning);
    }

    #[test]
    fn test_below_warning_band_is_not_anomalous() {
        let baseline = make_baseline(50.0, 10.0);
        assert!(detect(65.0, &baseline, &AnomalyConfig::default(), Utc::now()).is_none());
    }

    #[test]
    fn test_negative_deviation_keeps_sign() {
        let baseline = make_baseline(50.0, 10.0);
        let alert = detect(15.0, &baseline, &AnomalyConfig::default(), Utc::now())
            .expect("anomaly expected");
        assert!((alert.deviation_amount + 3.5).abs() < 1e-9);
        assert_eq!(alert.severity, Severity::Critical);
    }

    #[test]
    fn test_zero_variance_skips_detection() {
        let baseline = make_baseline(50.0, 0.0);
        assert!(detect(500.0, &baseline, &AnomalyConfig::default(), Utc::now()).is_none());
    }

    #[test]
    fn test_custom_bands() {
        let baseline = make_baseline(50.0, 10.0);
        let config = AnomalyConfig {
            warning_z: 1.0,
            critical_z: 2.0,
        };
        let alert = detect(65.0, &baseline, &config, Utc::now()).expect("anomaly expected");
        assert_eq!(alert.severity, Severity::Warning);
        let alert = detect(75.0, &baseline, &config, Utc::now()).expect("anomaly expected");
        assert_eq!(alert.severity, Severity::Critical);
    }
}
