//! Hardware-independent numeric building blocks.
/// BMP085 fixed-point compensation (calibration set, oversampling, pipeline).
pub mod compensation;
