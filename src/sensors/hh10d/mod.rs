//! HH10D relative humidity sensor.
//!
//! The capacitive element drives an oscillator whose frequency falls as
//! humidity rises. Two factory constants (sensitivity, offset) live in the
//! module's EEPROM; RH follows `(offset − f) × sensitivity / 4096`.
//!
//! Calibration failures do not gate measurement: the sensor keeps whatever
//! constants it last read (zeros at boot) and keeps measuring. Results are not
//! clamped to 0–100 %.
use core::fmt::Write;

use crate::core::{Reading, ReportBuffer};
use crate::error::{ReportError, SensorError};
use crate::protocol::transport::pulse::PulseEdgeTimer;
use crate::protocol::transport::traits::{
    digital_line::PulseInput, register_bus::RegisterBus, station_timer::StationTimer,
};
use crate::protocol::transport::{
    BUS_TRANSACTION_TIMEOUT_MS, CALIBRATION_READ_PAUSE_MS, PULSE_CAPTURE_TIMEOUT_MS,
};
use crate::sensors::Sensor;

/// I²C address of the calibration EEPROM.
pub const DEFAULT_ADDRESS: u8 = 0x51;
/// EEPROM word holding the sensitivity constant.
pub const SENSITIVITY_REGISTER: u8 = 0x0A;
/// EEPROM word holding the offset constant.
pub const OFFSET_REGISTER: u8 = 0x0C;

/// Relative humidity (%) for an output frequency `frequency_hz`.
pub fn relative_humidity(frequency_hz: f64, sensitivity: i16, offset: i16) -> f64 {
    (offset as f64 - frequency_hz) * sensitivity as f64 / 4096.0
}

pub struct Hh10d<I: PulseInput> {
    address: u8,
    meter: PulseEdgeTimer<I>,
    capture_timeout_ms: u32,
    sensitivity: i16,
    offset: i16,
    relative_humidity: f64,
}

impl<I: PulseInput> Hh10d<I> {
    /// Read the calibration constants and take an initial measurement.
    ///
    /// `divisor` is the ratio of the frequency pre-scaler between the sensor
    /// and `input`.
    pub async fn new<B: RegisterBus, T: StationTimer>(
        bus: &mut B,
        timer: &mut T,
        address: u8,
        input: I,
        divisor: u32,
    ) -> Self {
        let mut sensor = Self {
            address,
            meter: PulseEdgeTimer::new(input, divisor),
            capture_timeout_ms: PULSE_CAPTURE_TIMEOUT_MS,
            sensitivity: 0,
            offset: 0,
            relative_humidity: 0.0,
        };
        if let Err(_err) = sensor.get_calibration_data(bus, timer).await {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "HH10D @ {:#X}: calibration failed ({}), measuring anyway",
                address,
                defmt::Debug2Format(&_err)
            );
        }
        sensor.take_measurement(bus, timer).await;
        sensor
    }

    /// Override the pulse-capture deadline.
    pub fn with_capture_timeout(mut self, timeout_ms: u32) -> Self {
        self.capture_timeout_ms = timeout_ms;
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn sensitivity(&self) -> i16 {
        self.sensitivity
    }

    pub fn offset(&self) -> i16 {
        self.offset
    }

    /// Last published relative humidity (%).
    pub fn relative_humidity(&self) -> f64 {
        self.relative_humidity
    }
}

impl<I: PulseInput> Sensor for Hh10d<I> {
    type Value = f64;

    async fn get_calibration_data<'a, B: RegisterBus, T: StationTimer>(
        &'a mut self,
        bus: &'a mut B,
        timer: &'a mut T,
    ) -> Result<(), SensorError<B::Error>> {
        self.sensitivity = read_constant(bus, self.address, SENSITIVITY_REGISTER).await?;
        timer.delay_ms(CALIBRATION_READ_PAUSE_MS).await;
        self.offset = read_constant(bus, self.address, OFFSET_REGISTER).await?;
        timer.delay_ms(CALIBRATION_READ_PAUSE_MS).await;
        Ok(())
    }

    async fn take_measurement<'a, B: RegisterBus, T: StationTimer>(
        &'a mut self,
        _bus: &'a mut B,
        timer: &'a mut T,
    ) -> Reading<f64, SensorError<B::Error>> {
        match self.meter.measure_hz(timer, self.capture_timeout_ms).await {
            Ok(frequency) => {
                self.relative_humidity =
                    relative_humidity(frequency, self.sensitivity, self.offset);
                Reading::Fresh(self.relative_humidity)
            }
            Err(err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("HH10D: stale reading ({})", defmt::Debug2Format(&err));
                Reading::Stale {
                    last: self.relative_humidity,
                    reason: SensorError::Pulse(err),
                }
            }
        }
    }

    fn format_reading(&self, report: &mut ReportBuffer) -> Result<(), ReportError> {
        writeln!(report, "HH10D Humedad Relativa: {:.2}", self.relative_humidity).map_err(|_| {
            ReportError::BufferTooSmall {
                capacity: report.capacity(),
            }
        })
    }
}

/// Select `register`, then read a big-endian signed word.
async fn read_constant<B: RegisterBus>(
    bus: &mut B,
    address: u8,
    register: u8,
) -> Result<i16, SensorError<B::Error>> {
    bus.write(address, &[register], BUS_TRANSACTION_TIMEOUT_MS)
        .await
        .map_err(SensorError::Bus)?;
    let mut data = [0u8; 2];
    bus.read(address, &mut data, BUS_TRANSACTION_TIMEOUT_MS)
        .await
        .map_err(SensorError::Bus)?;
    Ok(i16::from_be_bytes(data))
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
