//! Station sensors: a small capability trait and the tagged enumeration used to
//! keep heterogeneous drivers in one array.
//!
//! Sensors never hold the register bus or the timer. Both are passed to every
//! operation, so all drivers share the single physical bus without locking.
use core::future::Future;

use crate::core::{Reading, ReportBuffer};
use crate::error::{ReportError, SensorError};
use crate::infra::compensation::Compensated;
use crate::protocol::transport::traits::{
    digital_line::{GainControl, PulseInput},
    register_bus::RegisterBus,
    station_timer::StationTimer,
};

pub mod bmp085;
pub mod hh10d;
pub mod tls230rlf;

use bmp085::Bmp085;
use hh10d::Hh10d;
use tls230rlf::Tls230rlf;

/// Capabilities shared by every station sensor.
pub trait Sensor {
    /// Value produced by one measurement.
    type Value: Copy;

    /// (Re)load calibration constants, or perform the sensor's initialisation
    /// side effect when it has none.
    fn get_calibration_data<'a, B: RegisterBus, T: StationTimer>(
        &'a mut self,
        bus: &'a mut B,
        timer: &'a mut T,
    ) -> impl Future<Output = Result<(), SensorError<B::Error>>> + 'a;

    /// Refresh the stored reading. Failures never propagate: the previous value
    /// is kept and returned as [`Reading::Stale`].
    fn take_measurement<'a, B: RegisterBus, T: StationTimer>(
        &'a mut self,
        bus: &'a mut B,
        timer: &'a mut T,
    ) -> impl Future<Output = Reading<Self::Value, SensorError<B::Error>>> + 'a;

    /// Append the stored reading as newline-terminated text lines.
    fn format_reading(&self, report: &mut ReportBuffer) -> Result<(), ReportError>;
}

/// Value of one [`StationSensor`] measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StationReading {
    PressureTemperature(Compensated),
    /// Relative humidity (%).
    Humidity(f64),
    /// Illuminance.
    Light(f64),
}

/// One entry of the station's sensor array.
pub enum StationSensor<I: PulseInput, O: GainControl> {
    PressureTemperature(Bmp085),
    Humidity(Hh10d<I>),
    Light(Tls230rlf<I, O>),
}

impl<I: PulseInput, O: GainControl> StationSensor<I, O> {
    /// Short label used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            StationSensor::PressureTemperature(_) => "BMP085",
            StationSensor::Humidity(_) => "HH10D",
            StationSensor::Light(_) => "TLS230RLF",
        }
    }
}

impl<I: PulseInput, O: GainControl> From<Bmp085> for StationSensor<I, O> {
    fn from(sensor: Bmp085) -> Self {
        StationSensor::PressureTemperature(sensor)
    }
}

impl<I: PulseInput, O: GainControl> From<Hh10d<I>> for StationSensor<I, O> {
    fn from(sensor: Hh10d<I>) -> Self {
        StationSensor::Humidity(sensor)
    }
}

impl<I: PulseInput, O: GainControl> From<Tls230rlf<I, O>> for StationSensor<I, O> {
    fn from(sensor: Tls230rlf<I, O>) -> Self {
        StationSensor::Light(sensor)
    }
}

impl<I: PulseInput, O: GainControl> Sensor for StationSensor<I, O> {
    type Value = StationReading;

    async fn get_calibration_data<'a, B: RegisterBus, T: StationTimer>(
        &'a mut self,
        bus: &'a mut B,
        timer: &'a mut T,
    ) -> Result<(), SensorError<B::Error>> {
        match self {
            StationSensor::PressureTemperature(sensor) => {
                sensor.get_calibration_data(bus, timer).await
            }
            StationSensor::Humidity(sensor) => sensor.get_calibration_data(bus, timer).await,
            StationSensor::Light(sensor) => sensor.get_calibration_data(bus, timer).await,
        }
    }

    async fn take_measurement<'a, B: RegisterBus, T: StationTimer>(
        &'a mut self,
        bus: &'a mut B,
        timer: &'a mut T,
    ) -> Reading<StationReading, SensorError<B::Error>> {
        match self {
            StationSensor::PressureTemperature(sensor) => sensor
                .take_measurement(bus, timer)
                .await
                .map(StationReading::PressureTemperature),
            StationSensor::Humidity(sensor) => sensor
                .take_measurement(bus, timer)
                .await
                .map(StationReading::Humidity),
            StationSensor::Light(sensor) => sensor
                .take_measurement(bus, timer)
                .await
                .map(StationReading::Light),
        }
    }

    fn format_reading(&self, report: &mut ReportBuffer) -> Result<(), ReportError> {
        match self {
            StationSensor::PressureTemperature(sensor) => sensor.format_reading(report),
            StationSensor::Humidity(sensor) => sensor.format_reading(report),
            StationSensor::Light(sensor) => sensor.format_reading(report),
        }
    }
}
