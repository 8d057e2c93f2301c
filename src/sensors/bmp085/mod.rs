//! BMP085 barometric pressure / temperature sensor.
//!
//! Lifecycle:
//! 1. [`Bmp085::new`] reads the eleven calibration words. Any bus failure here
//!    aborts construction: an uncalibrated sensor never exists, so it can never
//!    publish a bogus reading.
//! 2. Each [`Bmp085::measure`] starts a temperature conversion, then a pressure
//!    conversion, and compensates both raw samples.
//! 3. A failed measurement keeps the previous values and is reported as
//!    [`Reading::Stale`]; the caller decides whether to log it.
//!
//! Until the first successful measurement the published values are zero
//! (0 Pa, 0.00 °C). Every report carries the same labels, so a sensor that
//! calibrated but never converted is visible only as those zeros on the
//! collector side and as stale readings on the station side.
use core::fmt::Write;

use crate::core::{Reading, ReportBuffer};
use crate::error::{ReportError, SensorError};
use crate::infra::compensation::{
    compensate_with, CalibrationSet, Compensated, Oversampling, CALIBRATION_WORDS,
};
use crate::protocol::transport::traits::{
    register_bus::RegisterBus, station_timer::StationTimer,
};
use crate::protocol::transport::{BUS_TRANSACTION_TIMEOUT_MS, TEMPERATURE_SETTLE_MS};
use crate::sensors::Sensor;

/// Factory I²C address.
pub const DEFAULT_ADDRESS: u8 = 0x77;
/// Conversion control register.
pub const CONTROL_REGISTER: u8 = 0xF4;
/// First byte of the conversion result (MSB, LSB, XLSB).
pub const RESULT_REGISTER: u8 = 0xF6;
/// Control value starting a temperature conversion.
pub const TEMPERATURE_COMMAND: u8 = 0x2E;

/// Pascals per inch of mercury.
pub const PASCALS_PER_INCH_HG: f64 = 3386.389;

/// Convert pascals to inches of mercury.
#[inline]
pub fn inches_of_mercury(pascals: i64) -> f32 {
    (pascals as f64 / PASCALS_PER_INCH_HG) as f32
}

pub struct Bmp085 {
    address: u8,
    oversampling: Oversampling,
    calibration: CalibrationSet,
    last: Compensated,
}

impl Bmp085 {
    /// Calibrate the sensor, then take an initial measurement.
    ///
    /// Calibration errors are returned; a failed initial measurement is not.
    /// The sensor then publishes zeros until its first good cycle.
    pub async fn new<B: RegisterBus, T: StationTimer>(
        bus: &mut B,
        timer: &mut T,
        address: u8,
        oversampling: Oversampling,
    ) -> Result<Self, SensorError<B::Error>> {
        let calibration = read_calibration(bus, address).await?;

        #[cfg(feature = "defmt")]
        defmt::info!("BMP085 @ {:#X} calibrated", address);

        let mut sensor = Self {
            address,
            oversampling,
            calibration,
            last: Compensated::default(),
        };
        sensor.measure(bus, timer).await;
        Ok(sensor)
    }

    /// Run one conversion cycle.
    ///
    /// On success the new values are stored and returned as `Fresh`. On failure
    /// the stored values are left untouched and returned as `Stale`.
    pub async fn measure<B: RegisterBus, T: StationTimer>(
        &mut self,
        bus: &mut B,
        timer: &mut T,
    ) -> Reading<Compensated, SensorError<B::Error>> {
        match self.try_measure(bus, timer).await {
            Ok(values) => {
                self.last = values;
                Reading::Fresh(values)
            }
            Err(reason) => {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "BMP085 @ {:#X}: stale reading ({})",
                    self.address,
                    defmt::Debug2Format(&reason)
                );
                Reading::Stale {
                    last: self.last,
                    reason,
                }
            }
        }
    }

    async fn try_measure<B: RegisterBus, T: StationTimer>(
        &mut self,
        bus: &mut B,
        timer: &mut T,
    ) -> Result<Compensated, SensorError<B::Error>> {
        let ut = read_uncompensated_temperature(bus, timer, self.address).await?;
        let up = read_uncompensated_pressure(bus, timer, self.address, self.oversampling).await?;
        Ok(compensate_with(&self.calibration, ut, up, self.oversampling)?)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn oversampling(&self) -> Oversampling {
        self.oversampling
    }

    pub fn calibration(&self) -> &CalibrationSet {
        &self.calibration
    }

    /// Last published values.
    pub fn last(&self) -> Compensated {
        self.last
    }

    /// Last published pressure (Pa).
    pub fn pascals(&self) -> i64 {
        self.last.pressure_pa
    }

    /// Last published pressure (inHg).
    pub fn inches_mercury(&self) -> f32 {
        inches_of_mercury(self.last.pressure_pa)
    }

    /// Last published temperature (°C).
    pub fn celsius(&self) -> f32 {
        self.last.temperature_tenths as f32 / 10.0
    }
}

impl Sensor for Bmp085 {
    type Value = Compensated;

    async fn get_calibration_data<'a, B: RegisterBus, T: StationTimer>(
        &'a mut self,
        bus: &'a mut B,
        _timer: &'a mut T,
    ) -> Result<(), SensorError<B::Error>> {
        // Replace the set only once all eleven words were read.
        self.calibration = read_calibration(bus, self.address).await?;
        Ok(())
    }

    async fn take_measurement<'a, B: RegisterBus, T: StationTimer>(
        &'a mut self,
        bus: &'a mut B,
        timer: &'a mut T,
    ) -> Reading<Compensated, SensorError<B::Error>> {
        self.measure(bus, timer).await
    }

    fn format_reading(&self, report: &mut ReportBuffer) -> Result<(), ReportError> {
        let overflow = ReportError::BufferTooSmall {
            capacity: report.capacity(),
        };
        writeln!(report, "BMP085 Pascales: {}", self.pascals()).map_err(|_| overflow)?;
        writeln!(report, "BMP085 PulgadasMercurio: {:.2}", self.inches_mercury())
            .map_err(|_| overflow)?;
        writeln!(report, "BMP085 Temp*C: {:.2}", self.celsius()).map_err(|_| overflow)
    }
}

//==================================================================================BUS_HELPERS
/// Read the calibration block, one big-endian word per transaction pair.
pub async fn read_calibration<B: RegisterBus>(
    bus: &mut B,
    address: u8,
) -> Result<CalibrationSet, SensorError<B::Error>> {
    let mut words = [0u16; CALIBRATION_WORDS];
    for (index, word) in words.iter_mut().enumerate() {
        *word = read_word(bus, address, CalibrationSet::register(index)).await?;
    }
    Ok(CalibrationSet::from_words(words))
}

/// Select `register`, then read its MSB and LSB.
async fn read_word<B: RegisterBus>(
    bus: &mut B,
    address: u8,
    register: u8,
) -> Result<u16, SensorError<B::Error>> {
    bus.write(address, &[register], BUS_TRANSACTION_TIMEOUT_MS)
        .await
        .map_err(SensorError::Bus)?;
    let mut data = [0u8; 2];
    bus.read(address, &mut data, BUS_TRANSACTION_TIMEOUT_MS)
        .await
        .map_err(SensorError::Bus)?;
    Ok(u16::from_be_bytes(data))
}

async fn read_uncompensated_temperature<B: RegisterBus, T: StationTimer>(
    bus: &mut B,
    timer: &mut T,
    address: u8,
) -> Result<i64, SensorError<B::Error>> {
    bus.write(
        address,
        &[CONTROL_REGISTER, TEMPERATURE_COMMAND],
        BUS_TRANSACTION_TIMEOUT_MS,
    )
    .await
    .map_err(SensorError::Bus)?;

    timer.delay_ms(TEMPERATURE_SETTLE_MS).await;

    Ok(read_word(bus, address, RESULT_REGISTER).await? as i64)
}

async fn read_uncompensated_pressure<B: RegisterBus, T: StationTimer>(
    bus: &mut B,
    timer: &mut T,
    address: u8,
    oversampling: Oversampling,
) -> Result<i64, SensorError<B::Error>> {
    bus.write(
        address,
        &[CONTROL_REGISTER, oversampling.pressure_command()],
        BUS_TRANSACTION_TIMEOUT_MS,
    )
    .await
    .map_err(SensorError::Bus)?;

    timer.delay_ms(oversampling.settle_time_ms()).await;

    let mut data = [0u8; 3];
    bus.read_register(address, RESULT_REGISTER, &mut data, BUS_TRANSACTION_TIMEOUT_MS)
        .await
        .map_err(SensorError::Bus)?;

    let raw = ((data[0] as i64) << 16) | ((data[1] as i64) << 8) | data[2] as i64;
    Ok(raw >> oversampling.readout_shift())
}
