//! `meteo-station` library: acquisition core of a weather station in a
//! `no_std` environment. The crate exposes the numeric infrastructure
//! (fixed-point compensation), the transport layer (edge timing, bounded
//! report transmission, hardware traits), the sensor drivers, and the
//! acquisition loop.
#![no_std]
//==================================================================================
/// Core data types shared by the sensors, the station and the transport layer.
pub mod core;
/// Compensation, pulse-capture, sensor, report and transmission errors.
pub mod error;
/// Hardware-independent numeric building blocks (BMP085 compensation).
pub mod infra;
/// Transport layer: hardware traits, pulse-edge timing, reliable send.
pub mod protocol;
/// BMP085, HH10D and TLS230RLF drivers behind a common `Sensor` trait.
pub mod sensors;
/// Acquisition cycle and forever loop.
pub mod station;
//==================================================================================
