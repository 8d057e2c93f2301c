//! Edge-timing capture for frequency-output sensors.
//!
//! Three consecutive transitions bound exactly one full period of the square
//! wave (rising → falling → rising, or the opposite). The elapsed ticks between
//! the first and third edge give the frequency seen on the pin; the sensor's
//! external pre-scaler is then undone by multiplying with its divisor.
//!
//! The capture races a deadline: a silent line yields
//! [`PulseError::Timeout`] instead of freezing the acquisition cycle.
use crate::error::PulseError;
use crate::protocol::transport::traits::{digital_line::PulseInput, station_timer::StationTimer};
use futures_util::future::{select, Either};
use futures_util::pin_mut;

/// Number of transitions observed per capture (bounds one full period).
pub const EDGES_PER_CAPTURE: usize = 3;

/// Wait for three transitions on `input` and return the ticks between the
/// first and the third one.
///
/// Fails with [`PulseError::Timeout`] when the three edges are not seen within
/// `timeout_ms`.
pub async fn capture_period<I: PulseInput, T: StationTimer>(
    input: &mut I,
    timer: &mut T,
    timeout_ms: u32,
) -> Result<u64, PulseError> {
    let capture = async {
        let first = input.wait_for_edge().await;
        let mut last = first;
        for _ in 1..EDGES_PER_CAPTURE {
            last = input.wait_for_edge().await;
        }
        // Free-running counters wrap; the difference stays correct modulo 2^64.
        last.wrapping_sub(first)
    };
    let deadline = timer.delay_ms(timeout_ms);
    pin_mut!(capture);
    pin_mut!(deadline);

    match select(capture, deadline).await {
        Either::Left((elapsed, _)) => Ok(elapsed),
        Either::Right(_) => {
            #[cfg(feature = "defmt")]
            defmt::warn!("Pulse capture timed out after {} ms", timeout_ms);
            Err(PulseError::Timeout { timeout_ms })
        }
    }
}

/// Deadline (ms) long enough to capture one period of a sensor running at
/// `frequency_hz` behind a `divisor` pre-scaler.
///
/// A capture may start just after an edge: up to half a pin period passes
/// before the first edge, then one full period. The result covers those 1.5
/// pin periods, rounded up. `frequency_hz` must not be zero.
pub const fn capture_timeout_ms(frequency_hz: u32, divisor: u32) -> u32 {
    (1_500 * divisor as u64).div_ceil(frequency_hz as u64) as u32
}

/// Convert a captured period into the sensor's output frequency (Hz).
///
/// `divisor` undoes the hardware frequency pre-scaler placed between the sensor
/// and the pin.
pub fn frequency_hz(
    elapsed_ticks: u64,
    ticks_per_second: u64,
    divisor: u32,
) -> Result<f64, PulseError> {
    if elapsed_ticks == 0 {
        return Err(PulseError::ZeroPeriod);
    }
    let on_pin = ticks_per_second as f64 / elapsed_ticks as f64;
    Ok(on_pin * divisor as f64)
}

/// Frequency meter bound to one input line and its pre-scaler.
pub struct PulseEdgeTimer<I: PulseInput> {
    input: I,
    divisor: u32,
}

impl<I: PulseInput> PulseEdgeTimer<I> {
    pub fn new(input: I, divisor: u32) -> Self {
        Self { input, divisor }
    }

    /// Capture one period and return the sensor frequency in hertz.
    pub async fn measure_hz<T: StationTimer>(
        &mut self,
        timer: &mut T,
        timeout_ms: u32,
    ) -> Result<f64, PulseError> {
        let ticks_per_second = self.input.ticks_per_second();
        let elapsed = capture_period(&mut self.input, timer, timeout_ms).await?;
        frequency_hz(elapsed, ticks_per_second, self.divisor)
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
