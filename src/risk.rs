//! Risk trajectory engine
//!
//! Five structurally identical condition sub-models share one parameterized
//! algorithm driven by a static per-condition table: base risk, deficit
//! weights, age terms, step rules with driver messages, and progression
//! constants. Keeping the constants in one table prevents drift between
//! conditions that the original per-condition functions could not rule out.
//!
//! Algorithm per condition:
//! 1. Condition base risk (comorbid override when the gating flag is set)
//! 2. Deficit-proportional contributions for HRV and deep sleep
//! 3. Fixed step increments for crossed thresholds and comorbidities,
//!    each carrying a driver message
//! 4. Age-linear term above the condition's reference age
//! 5. Ceiling clamp on current risk
//! 6. Annual progression scaled inversely by the protective factor
//! 7. Horizon projections at fixed multipliers, each clamped to 95
//! 8. Risk level from the five-year value (one-year for gated conditions
//!    with the flag set)
//! 9. Trend from the driving classification tier and gate flag

use crate::reference::{deep_sleep_target_for_age, hrv_target_for_age};
use crate::types::{
    Condition, DeepSleepTier, HrvTier, IntakeProfile, PhysiologicalClassification, RiskBundle,
    RiskLevel, RiskTrajectory, Trend,
};

/// Maximum projected risk at any horizon
pub const HORIZON_CEILING: f64 = 95.0;

/// Horizon multipliers applied to the annual progression rate
pub const SIX_MONTH_FACTOR: f64 = 0.5;
pub const ONE_YEAR_FACTOR: f64 = 1.0;
pub const FIVE_YEAR_FACTOR: f64 = 4.2;
pub const TEN_YEAR_FACTOR: f64 = 7.5;

/// Deep sleep threshold (minutes) treated as severely curtailed
const SEVERE_DEEP_SLEEP_MIN: f64 = 45.0;

/// Comorbidity flags read from the intake profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComorbidFlag {
    HeartFailure,
    Diabetes,
    ChronicKidneyDisease,
}

impl ComorbidFlag {
    fn is_set(&self, profile: &IntakeProfile) -> bool {
        match self {
            ComorbidFlag::HeartFailure => profile.has_heart_failure,
            ComorbidFlag::Diabetes => profile.has_diabetes,
            ComorbidFlag::ChronicKidneyDisease => profile.has_chronic_kidney_disease,
        }
    }
}

/// Predicate that fires a step increment
#[derive(Debug, Clone, Copy)]
enum StepTrigger {
    HrvTierLow,
    DeepSleepBelow(f64),
    DeepSleepInadequate,
    Flag(ComorbidFlag),
}

/// One step increment with its driver message
struct StepRule {
    trigger: StepTrigger,
    amount: f64,
    driver: &'static str,
}

/// Which physiological input scales this condition's progression
#[derive(Debug, Clone, Copy)]
enum ProtectiveFactor {
    Hrv,
    DeepSleep,
    Average,
}

/// Comorbidity gate: when the flag is already set, the condition starts
/// from a much higher base and progresses faster
struct GateParams {
    flag: ComorbidFlag,
    base_risk: f64,
    progression: f64,
    driver: &'static str,
}

/// Per-condition model constants
struct ConditionParams {
    condition: Condition,
    base_risk: f64,
    gate: Option<GateParams>,
    hrv_weight: f64,
    deep_sleep_weight: f64,
    reference_age: f64,
    per_year_rate: f64,
    ceiling: f64,
    base_progression: f64,
    progression_floor: f64,
    protective: ProtectiveFactor,
    steps: &'static [StepRule],
}

static DEMENTIA: ConditionParams = ConditionParams {
    condition: Condition::Dementia,
    base_risk: 5.0,
    gate: None,
    hrv_weight: 10.0,
    deep_sleep_weight: 20.0,
    reference_age: 45.0,
    per_year_rate: 0.8,
    ceiling: 88.0,
    base_progression: 2.2,
    progression_floor: 0.5,
    protective: ProtectiveFactor::DeepSleep,
    steps: &[
        StepRule {
            trigger: StepTrigger::DeepSleepBelow(SEVERE_DEEP_SLEEP_MIN),
            amount: 8.0,
            driver: "Deep sleep severely curtailed",
        },
        StepRule {
            trigger: StepTrigger::HrvTierLow,
            amount: 4.0,
            driver: "HRV well below age-adjusted range",
        },
        StepRule {
            trigger: StepTrigger::Flag(ComorbidFlag::Diabetes),
            amount: 6.0,
            driver: "Existing diabetes diagnosis",
        },
    ],
};

static CARDIOVASCULAR: ConditionParams = ConditionParams {
    condition: Condition::Cardiovascular,
    base_risk: 6.0,
    gate: None,
    hrv_weight: 22.0,
    deep_sleep_weight: 12.0,
    reference_age: 40.0,
    per_year_rate: 0.7,
    ceiling: 92.0,
    base_progression: 2.6,
    progression_floor: 0.45,
    protective: ProtectiveFactor::Hrv,
    steps: &[
        StepRule {
            trigger: StepTrigger::HrvTierLow,
            amount: 9.0,
            driver: "HRV well below age-adjusted range",
        },
        StepRule {
            trigger: StepTrigger::DeepSleepBelow(SEVERE_DEEP_SLEEP_MIN),
            amount: 4.0,
            driver: "Deep sleep severely curtailed",
        },
        StepRule {
            trigger: StepTrigger::Flag(ComorbidFlag::Diabetes),
            amount: 7.0,
            driver: "Existing diabetes diagnosis",
        },
        StepRule {
            trigger: StepTrigger::Flag(ComorbidFlag::ChronicKidneyDisease),
            amount: 6.0,
            driver: "Chronic kidney disease",
        },
    ],
};

static HEART_FAILURE: ConditionParams = ConditionParams {
    condition: Condition::HeartFailure,
    base_risk: 4.0,
    gate: Some(GateParams {
        flag: ComorbidFlag::HeartFailure,
        base_risk: 45.0,
        progression: 4.5,
        driver: "Existing heart failure diagnosis",
    }),
    hrv_weight: 20.0,
    deep_sleep_weight: 8.0,
    reference_age: 50.0,
    per_year_rate: 0.6,
    ceiling: 90.0,
    base_progression: 2.0,
    progression_floor: 0.45,
    protective: ProtectiveFactor::Hrv,
    steps: &[
        StepRule {
            trigger: StepTrigger::HrvTierLow,
            amount: 8.0,
            driver: "HRV well below age-adjusted range",
        },
        StepRule {
            trigger: StepTrigger::Flag(ComorbidFlag::ChronicKidneyDisease),
            amount: 7.0,
            driver: "Chronic kidney disease",
        },
        StepRule {
            trigger: StepTrigger::Flag(ComorbidFlag::Diabetes),
            amount: 5.0,
            driver: "Existing diabetes diagnosis",
        },
    ],
};

static COGNITIVE_DECLINE: ConditionParams = ConditionParams {
    condition: Condition::CognitiveDecline,
    base_risk: 5.0,
    gate: None,
    hrv_weight: 8.0,
    deep_sleep_weight: 22.0,
    reference_age: 48.0,
    per_year_rate: 0.65,
    ceiling: 85.0,
    base_progression: 1.8,
    progression_floor: 0.5,
    protective: ProtectiveFactor::DeepSleep,
    steps: &[
        StepRule {
            trigger: StepTrigger::DeepSleepBelow(SEVERE_DEEP_SLEEP_MIN),
            amount: 7.0,
            driver: "Deep sleep severely curtailed",
        },
        StepRule {
            trigger: StepTrigger::DeepSleepInadequate,
            amount: 3.0,
            driver: "Deep sleep below age-adjusted need",
        },
        StepRule {
            trigger: StepTrigger::HrvTierLow,
            amount: 3.0,
            driver: "HRV well below age-adjusted range",
        },
    ],
};

static METABOLIC: ConditionParams = ConditionParams {
    condition: Condition::Metabolic,
    base_risk: 7.0,
    gate: Some(GateParams {
        flag: ComorbidFlag::Diabetes,
        base_risk: 40.0,
        progression: 4.0,
        driver: "Existing diabetes diagnosis",
    }),
    hrv_weight: 12.0,
    deep_sleep_weight: 14.0,
    reference_age: 35.0,
    per_year_rate: 0.5,
    ceiling: 89.0,
    base_progression: 2.4,
    progression_floor: 0.4,
    protective: ProtectiveFactor::Average,
    steps: &[
        StepRule {
            trigger: StepTrigger::DeepSleepBelow(SEVERE_DEEP_SLEEP_MIN),
            amount: 5.0,
            driver: "Deep sleep severely curtailed",
        },
        StepRule {
            trigger: StepTrigger::HrvTierLow,
            amount: 4.0,
            driver: "HRV well below age-adjusted range",
        },
        StepRule {
            trigger: StepTrigger::Flag(ComorbidFlag::ChronicKidneyDisease),
            amount: 5.0,
            driver: "Chronic kidney disease",
        },
    ],
};

/// Inputs shared by every condition model
#[derive(Debug, Clone, Copy)]
pub struct RiskInputs<'a> {
    /// Window-average HRV (ms)
    pub avg_hrv_ms: f64,
    /// Window-average deep sleep (minutes)
    pub avg_deep_sleep_min: f64,
    /// Physiological classification of the same averages
    pub classification: &'a PhysiologicalClassification,
    /// Intake profile (age and comorbidity flags)
    pub profile: &'a IntakeProfile,
}

impl StepTrigger {
    fn fires(&self, inputs: &RiskInputs<'_>) -> bool {
        match self {
            StepTrigger::HrvTierLow => inputs.classification.hrv.tier == HrvTier::Low,
            StepTrigger::DeepSleepBelow(threshold) => inputs.avg_deep_sleep_min < *threshold,
            StepTrigger::DeepSleepInadequate => {
                inputs.classification.deep_sleep.tier == DeepSleepTier::Inadequate
            }
            StepTrigger::Flag(flag) => flag.is_set(inputs.profile),
        }
    }
}

/// Deficit contribution: proportional shortfall below target, clamped at
/// zero when the target is met
fn deficit_contribution(actual: f64, target: f64, weight: f64) -> f64 {
    if actual >= target {
        return 0.0;
    }
    (target - actual) / target * weight
}

fn risk_level_for(value: f64) -> RiskLevel {
    if value < 15.0 {
        RiskLevel::Low
    } else if value < 30.0 {
        RiskLevel::Moderate
    } else if value < 50.0 {
        RiskLevel::Elevated
    } else if value < 70.0 {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    }
}

fn compute_trajectory(params: &ConditionParams, inputs: &RiskInputs<'_>) -> RiskTrajectory {
    let profile = inputs.profile;
    let hrv_target = hrv_target_for_age(profile.age);
    let sleep_target = deep_sleep_target_for_age(profile.age);

    let gated = params
        .gate
        .as_ref()
        .filter(|g| g.flag.is_set(profile));

    let mut drivers: Vec<String> = Vec::new();
    let mut risk = match gated {
        Some(gate) => {
            drivers.push(gate.driver.to_string());
            gate.base_risk
        }
        None => params.base_risk,
    };

    risk += deficit_contribution(inputs.avg_hrv_ms, hrv_target, params.hrv_weight);
    risk += deficit_contribution(inputs.avg_deep_sleep_min, sleep_target, params.deep_sleep_weight);

    for step in params.steps {
        if step.trigger.fires(inputs) {
            risk += step.amount;
            drivers.push(step.driver.to_string());
        }
    }
    drivers.truncate(3);

    risk += ((profile.age as f64) - params.reference_age).max(0.0) * params.per_year_rate;

    let current = risk.min(params.ceiling);

    // Progression scales inversely with how far the protective factor sits
    // below target; the floor bounds the scaling for severely depressed
    // inputs.
    let protective_ratio = match params.protective {
        ProtectiveFactor::Hrv => inputs.avg_hrv_ms / hrv_target,
        ProtectiveFactor::DeepSleep => inputs.avg_deep_sleep_min / sleep_target,
        ProtectiveFactor::Average => {
            (inputs.avg_hrv_ms / hrv_target + inputs.avg_deep_sleep_min / sleep_target) / 2.0
        }
    };
    let base_progression = match gated {
        Some(gate) => gate.progression,
        None => params.base_progression,
    };
    let progression = base_progression * (1.0 / protective_ratio.max(params.progression_floor));

    let project = |factor: f64| (current + progression * factor).min(HORIZON_CEILING);
    let six_months = project(SIX_MONTH_FACTOR);
    let one_year = project(ONE_YEAR_FACTOR);
    let five_years = project(FIVE_YEAR_FACTOR);
    let ten_years = project(TEN_YEAR_FACTOR);

    // Gated conditions progress fast enough that nearer-term risk is the
    // more decision-relevant banding input.
    let level_basis = if gated.is_some() { one_year } else { five_years };
    let risk_level = risk_level_for(level_basis);

    let factor_at_best = match params.protective {
        ProtectiveFactor::Hrv => inputs.classification.hrv.tier == HrvTier::Favorable,
        ProtectiveFactor::DeepSleep => {
            inputs.classification.deep_sleep.tier == DeepSleepTier::Adequate
        }
        ProtectiveFactor::Average => {
            inputs.classification.hrv.tier == HrvTier::Favorable
                && inputs.classification.deep_sleep.tier == DeepSleepTier::Adequate
        }
    };
    let trend = if !factor_at_best || gated.is_some() {
        Trend::Worsening
    } else {
        Trend::Stable
    };

    RiskTrajectory {
        condition: params.condition,
        current,
        six_months,
        one_year,
        five_years,
        ten_years,
        risk_level,
        primary_drivers: drivers,
        trend,
    }
}

/// Compute all five condition trajectories for one snapshot
pub fn compute_bundle(inputs: &RiskInputs<'_>) -> RiskBundle {
    RiskBundle {
        dementia: compute_trajectory(&DEMENTIA, inputs),
        cardiovascular: compute_trajectory(&CARDIOVASCULAR, inputs),
        heart_failure: compute_trajectory(&HEART_FAILURE, inputs),
        cognitive_decline: compute_trajectory(&COGNITIVE_DECLINE, inputs),
        metabolic: compute_trajectory(&METABOLIC, inputs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify;
    use crate::types::Sex;

    fn make_profile(age: u32) -> IntakeProfile {
        IntakeProfile {
            age,
            sex: Sex::Male,
            has_heart_failure: false,
            has_diabetes: false,
            has_chronic_kidney_disease: false,
        }
    }

    fn bundle_for(
        avg_hrv: f64,
        avg_deep_sleep: f64,
        profile: &IntakeProfile,
    ) -> RiskBundle {
        let classification =
            classify::classify(avg_hrv, avg_deep_sleep, Some(profile)).unwrap();
        compute_bundle(&RiskInputs {
            avg_hrv_ms: avg_hrv,
            avg_deep_sleep_min: avg_deep_sleep,
            classification: &classification,
            profile,
        })
    }

    #[test]
    fn test_horizons_monotonic_across_inputs() {
        let mut profiles = Vec::new();
        for age in [18, 35, 50, 65, 150] {
            for flags in 0..8u8 {
                let mut p = make_profile(age);
                p.has_heart_failure = flags & 1 != 0;
                p.has_diabetes = flags & 2 != 0;
                p.has_chronic_kidney_disease = flags & 4 != 0;
                profiles.push(p);
            }
        }
        for profile in &profiles {
            for hrv in [1.0, 20.0, 45.0, 80.0] {
                for deep in [5.0, 40.0, 70.0, 120.0] {
                    let bundle = bundle_for(hrv, deep, profile);
                    for t in bundle.iter() {
                        assert!(t.current <= t.six_months);
                        assert!(t.six_months <= t.one_year);
                        assert!(t.one_year <= t.five_years);
                        assert!(t.five_years <= t.ten_years);
                        assert!(t.ten_years <= HORIZON_CEILING);
                        assert!(t.current >= 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_low_hrv_raises_cardiovascular_risk() {
        // age 50, low HRV and inadequate deep sleep
        let profile = make_profile(50);
        let depressed = bundle_for(20.0, 40.0, &profile);
        let favorable = bundle_for(60.0, 40.0, &profile);

        let current = depressed.cardiovascular.current;
        assert!(current > 6.0 && current < 90.0);
        assert!(current > favorable.cardiovascular.current);
    }

    #[test]
    fn test_heart_failure_comorbid_base() {
        let mut with_hf = make_profile(60);
        with_hf.has_heart_failure = true;
        let without_hf = make_profile(60);

        // Same inputs; only the gate flag differs. The base moves from 4 to
        // 45, so the gap in current risk is exactly 41 below the ceiling.
        let a = bundle_for(40.0, 60.0, &with_hf);
        let b = bundle_for(40.0, 60.0, &without_hf);
        assert!((a.heart_failure.current - b.heart_failure.current - 41.0).abs() < 1e-9);
        assert!(a
            .heart_failure
            .primary_drivers
            .iter()
            .any(|d| d.contains("heart failure")));
    }

    #[test]
    fn test_current_clamped_to_ceiling_under_extreme_inputs() {
        let mut profile = make_profile(150);
        profile.has_heart_failure = true;
        profile.has_diabetes = true;
        profile.has_chronic_kidney_disease = true;

        let bundle = bundle_for(1.0, 1.0, &profile);
        assert!(bundle.dementia.current <= 88.0);
        assert!(bundle.cardiovascular.current <= 92.0);
        assert!(bundle.heart_failure.current <= 90.0);
        assert!(bundle.cognitive_decline.current <= 85.0);
        assert!(bundle.metabolic.current <= 89.0);
        for t in bundle.iter() {
            assert!(t.ten_years <= HORIZON_CEILING);
        }
    }

    #[test]
    fn test_meeting_targets_zeroes_deficits() {
        // Favorable everything at a young age: risk stays at base
        let profile = make_profile(25);
        let bundle = bundle_for(80.0, 100.0, &profile);
        assert!((bundle.dementia.current - 5.0).abs() < 1e-9);
        assert!((bundle.cardiovascular.current - 6.0).abs() < 1e-9);
        assert!(bundle.dementia.primary_drivers.is_empty());
    }

    #[test]
    fn test_age_term_applies_above_reference() {
        // Dementia reference age 45, rate 0.8
        let at_ref = bundle_for(80.0, 100.0, &make_profile(45));
        let ten_past = bundle_for(80.0, 100.0, &make_profile(55));
        assert!((ten_past.dementia.current - at_ref.dementia.current - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_risk_level_bands() {
        assert_eq!(risk_level_for(10.0), RiskLevel::Low);
        assert_eq!(risk_level_for(15.0), RiskLevel::Moderate);
        assert_eq!(risk_level_for(29.9), RiskLevel::Moderate);
        assert_eq!(risk_level_for(30.0), RiskLevel::Elevated);
        assert_eq!(risk_level_for(50.0), RiskLevel::High);
        assert_eq!(risk_level_for(70.0), RiskLevel::Critical);
    }

    #[test]
    fn test_gated_condition_bands_on_one_year() {
        let mut profile = make_profile(60);
        profile.has_diabetes = true;
        let bundle = bundle_for(40.0, 60.0, &profile);

        // With the gate set, the band comes from the one-year projection
        assert_eq!(
            bundle.metabolic.risk_level,
            risk_level_for(bundle.metabolic.one_year)
        );
        // Ungated condition bands on five years
        assert_eq!(
            bundle.dementia.risk_level,
            risk_level_for(bundle.dementia.five_years)
        );
    }

    #[test]
    fn test_trend_never_improving() {
        for hrv in [10.0, 40.0, 90.0] {
            for deep in [20.0, 60.0, 110.0] {
                let bundle = bundle_for(hrv, deep, &make_profile(40));
                for t in bundle.iter() {
                    assert_ne!(t.trend, Trend::Improving);
                }
            }
        }
    }

    #[test]
    fn test_trend_stable_when_factor_at_best() {
        let profile = make_profile(30);
        let bundle = bundle_for(80.0, 100.0, &profile);
        assert_eq!(bundle.cardiovascular.trend, Trend::Stable);
        assert_eq!(bundle.dementia.trend, Trend::Stable);

        let depressed = bundle_for(20.0, 100.0, &profile);
        assert_eq!(depressed.cardiovascular.trend, Trend::Worsening);
        // Deep sleep still adequate, so the sleep-driven model stays stable
        assert_eq!(depressed.dementia.trend, Trend::Stable);
    }

    #[test]
    fn test_drivers_capped_at_three_in_insertion_order() {
        let mut profile = make_profile(55);
        profile.has_diabetes = true;
        profile.has_chronic_kidney_disease = true;

        // Low HRV + curtailed deep sleep + two comorbidities would fire four
        // cardiovascular rules; only the first three survive
        let bundle = bundle_for(15.0, 30.0, &profile);
        let drivers = &bundle.cardiovascular.primary_drivers;
        assert_eq!(drivers.len(), 3);
        assert_eq!(drivers[0], "HRV well below age-adjusted range");
        assert_eq!(drivers[1], "Deep sleep severely curtailed");
        assert_eq!(drivers[2], "Existing diabetes diagnosis");
    }

    #[test]
    fn test_progression_floor_bounds_scaling() {
        // Protective ratio near zero must not produce runaway progression
        let profile = make_profile(40);
        let bundle = bundle_for(0.1, 0.1, &profile);
        let t = &bundle.cardiovascular;
        // progression = 2.6 / 0.45; one-year adds exactly that much unless
        // clamped
        let expected = t.current + 2.6 / 0.45;
        assert!((t.one_year - expected.min(HORIZON_CEILING)).abs() < 1e-9);
    }

    #[test]
    fn test_top_concerns_ranked_by_five_year() {
        let mut profile = make_profile(60);
        profile.has_heart_failure = true;
        let bundle = bundle_for(25.0, 45.0, &profile);

        let [first, _second] = bundle.top_concerns();
        let max_five_year = bundle
            .iter()
            .map(|t| t.five_years)
            .fold(f64::NEG_INFINITY, f64::max);
        let first_traj = bundle.iter().find(|t| t.condition == first).unwrap();
        assert_eq!(first_traj.five_years, max_five_year);
    }
}
