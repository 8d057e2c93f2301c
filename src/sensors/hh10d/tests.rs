//! Tests for the HH10D conversion and formatting.
use super::*;

#[test]
/// Factory example constants (sensitivity 395, offset 7620).
fn test_relative_humidity_formula() {
    // (7620 - 6400) * 395 / 4096
    let rh = relative_humidity(6400.0, 395, 7620);
    assert!((rh - 117.651_367_187_5).abs() < 1e-9);
}

#[test]
/// Frequencies above the offset give negative humidity, passed through as-is.
fn test_out_of_range_is_not_clamped() {
    let rh = relative_humidity(8000.0, 395, 7620);
    assert!((rh - (-36.645_507_812_5)).abs() < 1e-9);
}

#[test]
/// Missing calibration (zeros) yields zero humidity rather than an error.
fn test_zero_calibration() {
    assert_eq!(relative_humidity(6400.0, 0, 0), 0.0);
}
