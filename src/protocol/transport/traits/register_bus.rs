//! Minimal abstraction for a register-addressed two-wire bus (I²C style).
//! Allows the sensor drivers to plug into any HAL, blocking or async.
use core::future::Future;

/// Contract for synchronous-looking bus transactions with a per-call timeout.
///
/// Every method is a complete transaction: it resolves once the device has
/// acknowledged, or fails on timeout/NACK with `Self::Error`.
pub trait RegisterBus {
    type Error: core::fmt::Debug;

    /// Write `bytes` (register address, optionally followed by a value) to `address`.
    fn write<'a>(
        &'a mut self,
        address: u8,
        bytes: &'a [u8],
        timeout_ms: u32,
    ) -> impl Future<Output = Result<(), Self::Error>> + 'a;

    /// Read `buffer.len()` bytes from `address` at its current register pointer.
    fn read<'a>(
        &'a mut self,
        address: u8,
        buffer: &'a mut [u8],
        timeout_ms: u32,
    ) -> impl Future<Output = Result<(), Self::Error>> + 'a;

    /// Select `register` then read `buffer.len()` bytes (repeated-start transaction).
    fn read_register<'a>(
        &'a mut self,
        address: u8,
        register: u8,
        buffer: &'a mut [u8],
        timeout_ms: u32,
    ) -> impl Future<Output = Result<(), Self::Error>> + 'a;
}
