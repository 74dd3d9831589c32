//! Numeric answer matching.
//!
//! A submission matches when the first numeric literal it contains lies within
//! a relative tolerance of the expected value. Matching is a pure predicate and
//! never fails: anything unreadable simply does not match.

use once_cell::sync::Lazy;
use regex::Regex;

/// Default relative tolerance (5%).
pub const DEFAULT_TOLERANCE: f64 = 0.05;

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-+]?(?:\d*\.\d+|\d+)").expect("number pattern is valid"));

/// Extract the leftmost signed decimal or integer literal from `text`.
///
/// Only the first literal counts: `"F = 12 N at 30 deg"` yields `12.0`.
pub fn extract_first_number(text: &str) -> Option<f64> {
    NUMBER
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Does `submission` contain a value acceptably close to `expected`?
///
/// For `expected == 0` the tolerance is used as an absolute bound
/// (`|u| < tolerance`); otherwise `|u - c| <= |tolerance * c|`.
/// Non-finite `expected` or `tolerance` never match.
pub fn matches(submission: &str, expected: f64, tolerance: f64) -> bool {
    if !expected.is_finite() || !tolerance.is_finite() {
        return false;
    }
    let Some(u) = extract_first_number(submission) else {
        return false;
    };
    within_tolerance(u, expected, tolerance)
}

/// [`matches`] with [`DEFAULT_TOLERANCE`].
pub fn matches_default(submission: &str, expected: f64) -> bool {
    matches(submission, expected, DEFAULT_TOLERANCE)
}

fn within_tolerance(u: f64, c: f64, tolerance: f64) -> bool {
    if c == 0.0 {
        return u.abs() < tolerance;
    }
    (u - c).abs() <= (tolerance * c).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_literal_only() {
        assert_eq!(extract_first_number("I got v = 33.5 m/s"), Some(33.5));
        assert_eq!(extract_first_number("F = 12 N at 30 deg"), Some(12.0));
        assert_eq!(extract_first_number("x=-4.25, y=3"), Some(-4.25));
        assert_eq!(extract_first_number("about .5"), Some(0.5));
        assert_eq!(extract_first_number("+7"), Some(7.0));
        assert_eq!(extract_first_number("no numbers here"), None);
        assert_eq!(extract_first_number(""), None);
    }

    #[test]
    fn scenario_v_final() {
        // 34 +/- 5% -> [32.3, 35.7]
        assert!(matches("I got v = 33.5 m/s", 34.0, 0.05));
        assert!(matches("35.69", 34.0, 0.05));
        assert!(matches("32.31", 34.0, 0.05));
        assert!(!matches("35.8", 34.0, 0.05));
        assert!(!matches("32.2", 34.0, 0.05));
    }

    #[test]
    fn exact_value_always_matches() {
        for &c in &[34.0, -12.5, 0.0007, 124.27, 1.0e6, -0.001] {
            for &t in &[0.01, 0.05, 0.2] {
                assert!(matches(&c.to_string(), c, t), "c={c} t={t}");
            }
        }
    }

    #[test]
    fn tolerance_boundary() {
        let eps = 1e-3;
        for &c in &[34.0, -12.5, 250.0] {
            let t = 0.05;
            let outside = c * (1.0 + t + eps);
            let inside = c * (1.0 + t - eps);
            assert!(!matches(&outside.to_string(), c, t), "outside c={c}");
            assert!(matches(&inside.to_string(), c, t), "inside c={c}");
        }
    }

    #[test]
    fn negative_expected_uses_symmetric_bound() {
        assert!(matches("-0.00069", -0.0007, 0.05));
        assert!(matches("Fy = -98 N", -100.0, 0.05));
        assert!(!matches("Fy = 98 N", -100.0, 0.05));
    }

    #[test]
    fn zero_expected_falls_back_to_absolute() {
        assert!(matches("value ≈ 0.001", 0.0, 0.05));
        assert!(!matches("value ≈ 1", 0.0, 0.05));
        assert!(!matches("0.05", 0.0, 0.05));
    }

    #[test]
    fn empty_or_unreadable_never_matches() {
        assert!(!matches("", 34.0, 0.05));
        assert!(!matches("", 0.0, 0.05));
        assert!(!matches("thirty four", 34.0, 0.05));
    }

    #[test]
    fn non_finite_inputs_fail_closed() {
        assert!(!matches("34", f64::NAN, 0.05));
        assert!(!matches("34", f64::INFINITY, 0.05));
        assert!(!matches("34", 34.0, f64::NAN));
    }

    #[test]
    fn only_first_number_is_considered() {
        // The correct value appears second and is ignored.
        assert!(!matches("t = 3 s so v = 34 m/s", 34.0, 0.05));
        assert!(matches_default("34 m/s after 3 s", 34.0));
    }
}
