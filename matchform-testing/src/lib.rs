//! Testing helpers shared across the workspace.

use assert_float_eq::*;

pub fn assert_slice_f64_absolute(expected: &[f64], actual: &[f64], epsilon: f64) {
    assert_eq!(
        expected.len(),
        actual.len(),
        "lengths do not match: {} ≠ {}",
        expected.len(),
        actual.len()
    );
    for (index, &expected) in expected.iter().enumerate() {
        let actual = actual[index];
        if actual != expected {
            assert_float_absolute_eq!(expected, actual, epsilon);
        }
    }
}

/// Asserts that a probability vector is a proper distribution: every element in `[0, 1]` and the
/// elements summing to 1 within `epsilon`.
pub fn assert_distribution(probs: &[f64], epsilon: f64) {
    for (index, &prob) in probs.iter().enumerate() {
        assert!(
            (0.0..=1.0).contains(&prob),
            "probability at index {index} out of range: {prob} in {probs:?}"
        );
    }
    let sum: f64 = probs.iter().sum();
    assert_float_absolute_eq!(1.0, sum, epsilon);
}
