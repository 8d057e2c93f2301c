//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (fixed-point compensation,
//! pulse capture, bus transactions, report assembly, transmission).
use thiserror_no_std::Error;

//================================================================================COMPENSATION_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Failures of the pressure/temperature fixed-point compensation.
pub enum CompensationError {
    /// Oversampling setting outside the supported 0..=3 range.
    #[error("Oversampling setting must be 0-3, got {setting}")]
    InvalidOversampling { setting: u8 },
    /// A calibration/raw-sample combination produced a zero divisor.
    #[error("Division by zero while computing {stage}")]
    DivisionByZero { stage: &'static str },
}

//================================================================================PULSE_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Failures while timing the edges of a frequency-output sensor.
pub enum PulseError {
    /// Fewer than three transitions were observed before the deadline.
    #[error("No complete period captured within {timeout_ms} ms")]
    Timeout { timeout_ms: u32 },
    /// First and third edges carry the same timestamp: frequency is undefined.
    #[error("Captured period is zero ticks")]
    ZeroPeriod,
}

//================================================================================SENSOR_ERROR
#[derive(Error, Debug)]
/// Errors raised by a sensor during calibration or measurement.
pub enum SensorError<E: core::fmt::Debug> {
    /// Register bus transaction failed (timeout, NACK...).
    #[error("Bus transaction error: {0:?}")]
    Bus(E),
    /// Raw samples could not be compensated.
    #[error(transparent)]
    Compensation(#[from] CompensationError),
    /// Frequency input did not yield a usable period.
    #[error(transparent)]
    Pulse(#[from] PulseError),
}

//================================================================================REPORT_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Issues encountered while rendering readings into the report buffer.
pub enum ReportError {
    /// The rendered text does not fit in the fixed-capacity buffer.
    #[error("Report buffer too small: capacity {capacity} bytes")]
    BufferTooSmall { capacity: usize },
}

//==================================================================================SEND_ERROR
#[derive(Error, Debug)]
/// Errors encountered when pushing a report over the stream transport.
pub enum SendError<E: core::fmt::Debug> {
    /// The deadline elapsed before every byte was confirmed sent.
    /// The peer may already hold the first `sent` bytes.
    #[error("Send timed out after {timeout_ms} ms ({sent}/{total} bytes sent)")]
    Timeout {
        timeout_ms: u32,
        sent: usize,
        total: usize,
    },
    /// The transport refused the write (connection reset, closed...).
    #[error("Transport error: {0:?}")]
    Transport(E),
}

//================================================================================STATION_ERROR
#[derive(Error, Debug)]
/// Unrecoverable failures of the acquisition loop.
pub enum StationError<E: core::fmt::Debug> {
    /// Report transmission failed; the link to the collector is considered lost.
    #[error("Report transmission failed: {0:?}")]
    Send(SendError<E>),
    /// The report could not be assembled.
    #[error(transparent)]
    Report(#[from] ReportError),
}
