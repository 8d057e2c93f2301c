//! Tests for the period → frequency conversion.
use super::*;

#[test]
/// 40 000 ticks at 1 MHz is 25 Hz on the pin, 6400 Hz behind a ÷256 pre-scaler.
fn test_frequency_with_divisor() {
    let freq = frequency_hz(40_000, 1_000_000, 256).unwrap();
    assert_eq!(freq, 6400.0);
}

#[test]
/// Divisor 1 leaves the pin frequency untouched.
fn test_frequency_without_divisor() {
    let freq = frequency_hz(20, 1_000_000, 1).unwrap();
    assert_eq!(freq, 50_000.0);
}

#[test]
/// 100 ns ticks (10 MHz), 0.5 s period → 2 Hz.
fn test_frequency_coarse_period() {
    let freq = frequency_hz(5_000_000, 10_000_000, 1).unwrap();
    assert_eq!(freq, 2.0);
}

#[test]
/// A zero-length period cannot be converted.
fn test_zero_period_is_rejected() {
    assert_eq!(frequency_hz(0, 1_000_000, 256), Err(PulseError::ZeroPeriod));
}

#[test]
/// 1.5 pin periods: 192 Hz behind ÷256 is 0.75 Hz on the pin, 2 s.
fn test_capture_timeout_covers_lowest_frequency() {
    assert_eq!(capture_timeout_ms(192, 256), 2_000);
    assert_eq!(
        crate::protocol::transport::PULSE_CAPTURE_TIMEOUT_MS,
        capture_timeout_ms(192, 256)
    );
    // The light sensor's low-range threshold needs far less.
    assert_eq!(capture_timeout_ms(512, 256), 750);
}

#[test]
/// A slower signal than the bound needs a longer deadline; partial
/// milliseconds round up.
fn test_capture_timeout_rounds_up() {
    assert!(capture_timeout_ms(100, 256) > capture_timeout_ms(192, 256));
    assert_eq!(capture_timeout_ms(7, 1), 215);
}
