//! BMP085 fixed-point compensation.
//!
//! Turns the two raw ADC samples (uncompensated temperature `ut` and
//! uncompensated pressure `up`) plus the factory calibration coefficients into
//! tenths of a degree Celsius and pascals.
//!
//! The integer pipeline is reproduced step by step: every intermediate is an
//! `i64`, right shifts are arithmetic (they floor negative values), divisions
//! truncate toward zero, and the final pressure division switches between
//! "double then divide" and "divide then double" around 2^31. Reordering any of
//! these operations shifts the output by a few pascals.
use crate::error::CompensationError;

/// Oversampling setting of the pressure conversion (precision vs. latency).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Oversampling {
    /// One internal sample, 5 ms conversion.
    UltraLowPower = 0,
    /// Two samples, 8 ms conversion.
    Standard = 1,
    /// Four samples, 14 ms conversion.
    HighResolution = 2,
    /// Eight samples, 26 ms conversion.
    UltraHighResolution = 3,
}

/// Pressure conversion time per oversampling setting (ms).
const PRESSURE_SETTLE_MS: [u32; 4] = [5, 8, 14, 26];

impl Oversampling {
    /// Raw `oss` value (0..=3).
    #[inline]
    pub const fn setting(self) -> u8 {
        self as u8
    }

    /// Time to wait between the pressure conversion command and the readout.
    #[inline]
    pub const fn settle_time_ms(self) -> u32 {
        PRESSURE_SETTLE_MS[self as usize]
    }

    /// Control byte written to register `0xF4` to start a pressure conversion.
    #[inline]
    pub const fn pressure_command(self) -> u8 {
        0x34 + ((self as u8) << 6)
    }

    /// Right shift applied to the 24-bit pressure readout.
    #[inline]
    pub const fn readout_shift(self) -> u8 {
        8 - self as u8
    }
}

impl TryFrom<u8> for Oversampling {
    type Error = CompensationError;

    fn try_from(setting: u8) -> Result<Self, Self::Error> {
        match setting {
            0 => Ok(Oversampling::UltraLowPower),
            1 => Ok(Oversampling::Standard),
            2 => Ok(Oversampling::HighResolution),
            3 => Ok(Oversampling::UltraHighResolution),
            _ => Err(CompensationError::InvalidOversampling { setting }),
        }
    }
}

/// Factory calibration coefficients stored in the sensor EEPROM (`0xAA..=0xBF`).
///
/// AC4, AC5 and AC6 are unsigned; the others are two's-complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalibrationSet {
    pub ac1: i16,
    pub ac2: i16,
    pub ac3: i16,
    pub ac4: u16,
    pub ac5: u16,
    pub ac6: u16,
    pub b1: i16,
    pub b2: i16,
    pub mb: i16,
    pub mc: i16,
    pub md: i16,
}

/// Register holding the MSB of AC1; the other coefficients follow every two bytes.
pub const CALIBRATION_BASE_REGISTER: u8 = 0xAA;
/// Number of 16-bit coefficients in the calibration block.
pub const CALIBRATION_WORDS: usize = 11;

impl CalibrationSet {
    /// Build the set from the eleven big-endian words read in register order
    /// (AC1, AC2, AC3, AC4, AC5, AC6, B1, B2, MB, MC, MD).
    pub fn from_words(words: [u16; CALIBRATION_WORDS]) -> Self {
        Self {
            ac1: words[0] as i16,
            ac2: words[1] as i16,
            ac3: words[2] as i16,
            ac4: words[3],
            ac5: words[4],
            ac6: words[5],
            b1: words[6] as i16,
            b2: words[7] as i16,
            mb: words[8] as i16,
            mc: words[9] as i16,
            md: words[10] as i16,
        }
    }

    /// Register address of the `index`-th coefficient.
    #[inline]
    pub const fn register(index: usize) -> u8 {
        CALIBRATION_BASE_REGISTER + (index as u8) * 2
    }
}

/// Compensated output of one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Compensated {
    /// Temperature in tenths of a degree Celsius.
    pub temperature_tenths: i64,
    /// Pressure in pascals.
    pub pressure_pa: i64,
}

/// Apply the compensation pipeline with a raw `oss` value.
///
/// Fails with [`CompensationError::InvalidOversampling`] for `oss > 3` instead of
/// producing a silently wrong pressure.
pub fn compensate(
    calibration: &CalibrationSet,
    ut: i64,
    up: i64,
    oss: u8,
) -> Result<Compensated, CompensationError> {
    let oversampling = Oversampling::try_from(oss)?;
    compensate_with(calibration, ut, up, oversampling)
}

/// Same as [`compensate`], with an already validated oversampling setting.
pub fn compensate_with(
    calibration: &CalibrationSet,
    ut: i64,
    up: i64,
    oversampling: Oversampling,
) -> Result<Compensated, CompensationError> {
    let ac1 = calibration.ac1 as i64;
    let ac2 = calibration.ac2 as i64;
    let ac3 = calibration.ac3 as i64;
    let ac4 = calibration.ac4 as i64;
    let ac5 = calibration.ac5 as i64;
    let ac6 = calibration.ac6 as i64;
    let b1 = calibration.b1 as i64;
    let b2 = calibration.b2 as i64;
    let mc = calibration.mc as i64;
    let md = calibration.md as i64;
    let oss = oversampling.setting() as u32;

    // Temperature.
    let x1 = ((ut - ac6) * ac5) >> 15;
    let x2 = (mc << 11)
        .checked_div(x1 + md)
        .ok_or(CompensationError::DivisionByZero { stage: "x2" })?;
    let b5 = x1 + x2;
    let temperature_tenths = (b5 + 8) >> 4;

    // Pressure.
    let b6 = b5 - 4000;
    let x1 = (b2 * ((b6 * b6) >> 12)) >> 11;
    let x2 = (ac2 * b6) >> 11;
    let x3 = x1 + x2;
    let b3 = match oversampling {
        Oversampling::UltraLowPower => ((ac1 * 4 + x3) + 2) >> 2,
        Oversampling::Standard => ((ac1 * 4 + x3) + 2) >> 1,
        Oversampling::HighResolution => (ac1 * 4 + x3) + 2,
        Oversampling::UltraHighResolution => ((ac1 * 4 + x3) + 2) << 1,
    };
    let x1 = (ac3 * b6) >> 13;
    let x2 = (b1 * ((b6 * b6) >> 12)) >> 16;
    let x3 = ((x1 + x2) + 2) >> 2;
    let b4 = (ac4 * (x3 + 32768)) >> 15;
    let b7 = (up - b3) * (50000 >> oss);
    if b4 == 0 {
        return Err(CompensationError::DivisionByZero { stage: "b4" });
    }
    let p = if b7 < 0x8000_0000 {
        (b7 * 2) / b4
    } else {
        (b7 / b4) * 2
    };
    let x1 = (p >> 8) * (p >> 8);
    let x1 = (x1 * 3038) >> 16;
    let x2 = (-7357 * p) >> 16;
    let pressure_pa = p + ((x1 + x2 + 3791) >> 4);

    Ok(Compensated {
        temperature_tenths,
        pressure_pa,
    })
}
