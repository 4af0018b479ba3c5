//! Age-banded reference targets
//!
//! One shared lookup for the reference targets used by both the
//! physiological classifier and the risk trajectory engine. Both consumers
//! must see identical tables, so the tables live here and nowhere else.

/// Reference HRV target (ms) for an age
pub fn hrv_target_for_age(age: u32) -> f64 {
    match age {
        0..=29 => 60.0,
        30..=39 => 48.0,
        40..=49 => 38.0,
        50..=59 => 30.0,
        _ => 24.0,
    }
}

/// Reference deep sleep target (minutes) for an age
pub fn deep_sleep_target_for_age(age: u32) -> f64 {
    match age {
        0..=29 => 90.0,
        30..=44 => 75.0,
        45..=59 => 60.0,
        _ => 50.0,
    }
}

/// Estimate relative standing against the age-banded reference population.
///
/// Maps the value/target ratio through `100 * r / (r + 1)`: 50 at target,
/// strictly monotonic in value, bounded in (0, 100). No distributional
/// assumption is made beyond monotonicity.
pub fn percentile_estimate(value: f64, target: f64) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    let ratio = value / target;
    100.0 * ratio / (ratio + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hrv_target_bands() {
        assert_eq!(hrv_target_for_age(25), 60.0);
        assert_eq!(hrv_target_for_age(30), 48.0);
        assert_eq!(hrv_target_for_age(39), 48.0);
        assert_eq!(hrv_target_for_age(45), 38.0);
        assert_eq!(hrv_target_for_age(55), 30.0);
        assert_eq!(hrv_target_for_age(60), 24.0);
        assert_eq!(hrv_target_for_age(90), 24.0);
    }

    #[test]
    fn test_deep_sleep_target_bands() {
        assert_eq!(deep_sleep_target_for_age(22), 90.0);
        assert_eq!(deep_sleep_target_for_age(30), 75.0);
        assert_eq!(deep_sleep_target_for_age(44), 75.0);
        assert_eq!(deep_sleep_target_for_age(50), 60.0);
        assert_eq!(deep_sleep_target_for_age(60), 50.0);
    }

    #[test]
    fn test_targets_never_zero() {
        for age in 1..=150 {
            assert!(hrv_target_for_age(age) > 0.0);
            assert!(deep_sleep_target_for_age(age) > 0.0);
        }
    }

    #[test]
    fn test_percentile_at_target_is_fifty() {
        assert!((percentile_estimate(38.0, 38.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_monotonic_in_value() {
        let target = 60.0;
        let mut prev = percentile_estimate(1.0, target);
        for v in 2..200 {
            let p = percentile_estimate(v as f64, target);
            assert!(p > prev);
            prev = p;
        }
    }

    #[test]
    fn test_percentile_bounded() {
        assert_eq!(percentile_estimate(0.0, 60.0), 0.0);
        assert!(percentile_estimate(10_000.0, 60.0) < 100.0);
    }
}
