//! Health score composition
//!
//! The weighting logic itself lives in an external service; this module owns
//! the composition contract: validate the four component weights, compute
//! the weighted composite, and carry the reasoning text through.

use crate::error::DeriveError;
use crate::types::{ComponentScore, HealthScore};
use chrono::NaiveDate;

/// Tolerance for the weight-sum check
pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// The four daily score components with their weights
#[derive(Debug, Clone, Copy)]
pub struct ScoreComponents {
    pub hrv: ComponentScore,
    pub sleep: ComponentScore,
    pub recovery: ComponentScore,
    pub activity: ComponentScore,
}

impl ScoreComponents {
    fn all(&self) -> [ComponentScore; 4] {
        [self.hrv, self.sleep, self.recovery, self.activity]
    }
}

/// Compose a daily health score from weighted components.
///
/// Weights must each lie in [0, 1] and sum to 1; violations are errors, not
/// silently renormalized. The composite is clamped to [0, 100] even under
/// out-of-band component scores.
pub fn compose(
    date: NaiveDate,
    components: ScoreComponents,
    reasoning: impl Into<String>,
) -> Result<HealthScore, DeriveError> {
    for component in components.all() {
        if !(0.0..=1.0).contains(&component.weight) {
            return Err(DeriveError::InvalidWeights(format!(
                "weight {} outside [0, 1]",
                component.weight
            )));
        }
    }
    let weight_sum: f64 = components.all().iter().map(|c| c.weight).sum();
    if (weight_sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
        return Err(DeriveError::InvalidWeights(format!(
            "weights sum to {weight_sum}, expected 1"
        )));
    }

    let overall = components
        .all()
        .iter()
        .map(|c| c.score * c.weight)
        .sum::<f64>()
        .clamp(0.0, 100.0);

    Ok(HealthScore {
        date,
        overall_score: overall,
        hrv: components.hrv,
        sleep: components.sleep,
        recovery: components.recovery,
        activity: components.activity,
        reasoning: reasoning.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(score: f64, weight: f64) -> ComponentScore {
        ComponentScore { score, weight }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    #[test]
    fn test_weighted_composite() {
        let score = compose(
            date(),
            ScoreComponents {
                hrv: component(80.0, 0.3),
                sleep: component(60.0, 0.3),
                recovery: component(90.0, 0.2),
                activity: component(50.0, 0.2),
            },
            "Sleep weighted up after restless week",
        )
        .unwrap();

        // 24 + 18 + 18 + 10
        assert!((score.overall_score - 70.0).abs() < 1e-9);
        assert_eq!(score.reasoning, "Sleep weighted up after restless week");
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let result = compose(
            date(),
            ScoreComponents {
                hrv: component(80.0, 0.3),
                sleep: component(60.0, 0.3),
                recovery: component(90.0, 0.3),
                activity: component(50.0, 0.3),
            },
            "",
        );
        assert!(matches!(result, Err(DeriveError::InvalidWeights(_))));
    }

    #[test]
    fn test_weight_out_of_range() {
        let result = compose(
            date(),
            ScoreComponents {
                hrv: component(80.0, 1.2),
                sleep: component(60.0, -0.2),
                recovery: component(90.0, 0.0),
                activity: component(50.0, 0.0),
            },
            "",
        );
        assert!(matches!(result, Err(DeriveError::InvalidWeights(_))));
    }

    #[test]
    fn test_composite_clamped() {
        let score = compose(
            date(),
            ScoreComponents {
                hrv: component(500.0, 0.25),
                sleep: component(500.0, 0.25),
                recovery: component(500.0, 0.25),
                activity: component(500.0, 0.25),
            },
            "",
        )
        .unwrap();
        assert_eq!(score.overall_score, 100.0);
    }
}
