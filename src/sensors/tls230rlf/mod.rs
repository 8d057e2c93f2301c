//! TSL230-family light-to-frequency converter ("TLS230RLF" on the station
//! wiring), with automatic sensitivity switching.
//!
//! # Gain range
//!
//! The gain-control line selects between two sensitivity regimes. Switching
//! uses a dead band so the range never oscillates near a threshold:
//!
//! | measured frequency      | line low (low range) | line high (high range) |
//! |-------------------------|----------------------|------------------------|
//! | `f ≥ 50 000 Hz`         | switch to high       | stay                   |
//! | `512 Hz < f < 50 000 Hz`| stay                 | stay                   |
//! | `f ≤ 512 Hz`            | stay                 | switch to low          |
//!
//! Illuminance is computed with the range in force *after* the switch.
//!
//! TODO: the ×130 / ×1.30 factors differ by 100× across the switch; confirm
//! them against the TSL230 datasheet before using the absolute values.
use core::fmt::Write;

use crate::core::{Reading, ReportBuffer};
use crate::error::{PulseError, ReportError, SensorError};
use crate::protocol::transport::pulse::PulseEdgeTimer;
use crate::protocol::transport::traits::{
    digital_line::{GainControl, PulseInput},
    register_bus::RegisterBus,
    station_timer::StationTimer,
};
use crate::protocol::transport::PULSE_CAPTURE_TIMEOUT_MS;
use crate::sensors::Sensor;

/// At or above this frequency a low-range sensor switches to high range (Hz).
pub const HIGH_RANGE_THRESHOLD_HZ: f64 = 50_000.0;
/// At or below this frequency a high-range sensor switches to low range (Hz).
pub const LOW_RANGE_THRESHOLD_HZ: f64 = 512.0;

/// Scale factor applied in high range.
pub const HIGH_RANGE_FACTOR: f64 = 130.0;
/// Scale factor applied in low range.
pub const LOW_RANGE_FACTOR: f64 = 1.30;
/// Photodiode area / responsivity normalisation.
pub const AREA_FACTOR: f64 = 100.0 / 1_000_000.0;
/// Luminous efficacy at 555 nm (lm/W).
pub const LUMINOUS_EFFICACY: f64 = 683.0;

/// Sensitivity regime selected by the gain-control line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainRange {
    /// Line low.
    Low,
    /// Line high.
    High,
}

impl GainRange {
    fn of_line<O: GainControl>(line: &O) -> Self {
        if line.is_set_high() {
            GainRange::High
        } else {
            GainRange::Low
        }
    }

    /// Range to use after measuring `frequency_hz` in range `self`.
    pub fn next(self, frequency_hz: f64) -> Self {
        match self {
            GainRange::Low if frequency_hz >= HIGH_RANGE_THRESHOLD_HZ => GainRange::High,
            GainRange::High if frequency_hz <= LOW_RANGE_THRESHOLD_HZ => GainRange::Low,
            unchanged => unchanged,
        }
    }

    fn factor(self) -> f64 {
        match self {
            GainRange::High => HIGH_RANGE_FACTOR,
            GainRange::Low => LOW_RANGE_FACTOR,
        }
    }
}

/// Illuminance for `frequency_hz` measured in range `gain`.
pub fn illuminance(frequency_hz: f64, gain: GainRange) -> f64 {
    let mut value = (frequency_hz * gain.factor()) / 1000.0;
    value *= AREA_FACTOR;
    value *= LUMINOUS_EFFICACY;
    value
}

pub struct Tls230rlf<I: PulseInput, O: GainControl> {
    meter: PulseEdgeTimer<I>,
    gain_line: O,
    capture_timeout_ms: u32,
    illuminance: f64,
}

impl<I: PulseInput, O: GainControl> Tls230rlf<I, O> {
    /// Drive the gain line to its default (high) level and take an initial
    /// measurement.
    pub async fn new<T: StationTimer>(
        timer: &mut T,
        input: I,
        mut gain_line: O,
        divisor: u32,
    ) -> Self {
        gain_line.set_high();
        let mut sensor = Self {
            meter: PulseEdgeTimer::new(input, divisor),
            gain_line,
            capture_timeout_ms: PULSE_CAPTURE_TIMEOUT_MS,
            illuminance: 0.0,
        };
        if let Err(_err) = sensor.measure(timer).await {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "TLS230RLF: initial measurement failed ({})",
                defmt::Debug2Format(&_err)
            );
        }
        sensor
    }

    /// Override the pulse-capture deadline.
    pub fn with_capture_timeout(mut self, timeout_ms: u32) -> Self {
        self.capture_timeout_ms = timeout_ms;
        self
    }

    /// Capture one period, update the gain range, and compute illuminance.
    pub async fn measure<T: StationTimer>(&mut self, timer: &mut T) -> Result<f64, PulseError> {
        let frequency = self.meter.measure_hz(timer, self.capture_timeout_ms).await?;

        let current = GainRange::of_line(&self.gain_line);
        let next = current.next(frequency);
        if next != current {
            match next {
                GainRange::High => self.gain_line.set_high(),
                GainRange::Low => self.gain_line.set_low(),
            }
            #[cfg(feature = "defmt")]
            defmt::info!(
                "TLS230RLF: gain switched to {} range at {} Hz",
                if next == GainRange::High { "high" } else { "low" },
                frequency
            );
        }

        self.illuminance = illuminance(frequency, GainRange::of_line(&self.gain_line));
        Ok(self.illuminance)
    }

    /// Range currently selected on the gain line.
    pub fn gain(&self) -> GainRange {
        GainRange::of_line(&self.gain_line)
    }

    /// Last published illuminance.
    pub fn illuminance(&self) -> f64 {
        self.illuminance
    }
}

impl<I: PulseInput, O: GainControl> Sensor for Tls230rlf<I, O> {
    type Value = f64;

    /// No calibration memory: restore the default (high) gain range.
    async fn get_calibration_data<'a, B: RegisterBus, T: StationTimer>(
        &'a mut self,
        _bus: &'a mut B,
        _timer: &'a mut T,
    ) -> Result<(), SensorError<B::Error>> {
        self.gain_line.set_high();
        Ok(())
    }

    async fn take_measurement<'a, B: RegisterBus, T: StationTimer>(
        &'a mut self,
        _bus: &'a mut B,
        timer: &'a mut T,
    ) -> Reading<f64, SensorError<B::Error>> {
        match self.measure(timer).await {
            Ok(value) => Reading::Fresh(value),
            Err(err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("TLS230RLF: stale reading ({})", defmt::Debug2Format(&err));
                Reading::Stale {
                    last: self.illuminance,
                    reason: SensorError::Pulse(err),
                }
            }
        }
    }

    fn format_reading(&self, report: &mut ReportBuffer) -> Result<(), ReportError> {
        writeln!(report, "TLS230RLF (Lumenes): {:.2}", self.illuminance).map_err(|_| {
            ReportError::BufferTooSmall {
                capacity: report.capacity(),
            }
        })
    }
}
