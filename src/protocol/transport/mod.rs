//! Acquisition transport layer: edge timing for frequency-output sensors,
//! bounded report transmission, and hardware abstraction traits.
//!
//! ## Timing Constants
//!
//! These constants define the delays and deadlines used by a station running
//! with the default [`StationConfig`](crate::station::StationConfig).

pub mod pulse;
pub mod reliable_send;
pub mod traits;

/// Timeout handed to every register bus transaction (ms).
///
/// A BMP085/HH10D transaction at 40 kHz moves a handful of bytes in well under
/// 5 ms; the long timeout only matters when the bus is stuck (clock stretching,
/// missing pull-ups).
pub const BUS_TRANSACTION_TIMEOUT_MS: u32 = 1000;

/// Deadline for pushing one report to the collector (ms).
pub const REPORT_SEND_TIMEOUT_MS: u32 = 10_000;

/// Pause between the end of one acquisition cycle and the start of the next (ms).
///
/// This is not a period: the cycle length varies with sensor latency and no
/// drift compensation is applied.
pub const CYCLE_PAUSE_MS: u32 = 500;

/// Frequency pre-scaler fitted between the frequency-output sensors and their
/// input pins.
pub const DEFAULT_FREQUENCY_DIVISOR: u32 = 256;

/// Slowest sensor output (Hz) the default capture deadline still catches.
pub const LOWEST_CAPTURED_FREQUENCY_HZ: u32 = 192;

/// Upper bound for capturing one period of a frequency-output sensor (ms).
///
/// # Rationale
///
/// A capture needs up to 1.5 pin periods. Behind ÷256, 192 Hz reaches the pin
/// at 0.75 Hz, which gives 2 s. Slower outputs always hit the deadline and
/// keep their previous reading. The light sensor's low range starts at 512 Hz,
/// so the darkest part of that range (below 192 Hz) is not reported with the
/// default. Installations that need it raise the deadline per sensor with
/// `with_capture_timeout(capture_timeout_ms(..))`, at the cost of a longer
/// cycle while the line is dark or disconnected.
pub const PULSE_CAPTURE_TIMEOUT_MS: u32 =
    pulse::capture_timeout_ms(LOWEST_CAPTURED_FREQUENCY_HZ, DEFAULT_FREQUENCY_DIVISOR);

/// Pause after each humidity-sensor calibration read (ms).
pub const CALIBRATION_READ_PAUSE_MS: u32 = 1;

/// Temperature conversion time of the BMP085 (ms).
pub const TEMPERATURE_SETTLE_MS: u32 = 5;
