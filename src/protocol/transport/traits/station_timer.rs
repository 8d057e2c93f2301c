//! Asynchronous timer abstraction providing the timing primitives required
//! by conversion settle times, pulse-capture deadlines and send deadlines.

/// Timer trait abstraction; must remain thread-safe when applicable.
pub trait StationTimer {
    /// Asynchronously wait for `millis` milliseconds.
    fn delay_ms<'a>(&'a mut self, millis: u32) -> impl core::future::Future<Output = ()> + 'a;

    /// Monotonic time in milliseconds. Only differences are meaningful.
    fn now_ms(&mut self) -> u64;
}

#[cfg(feature = "embassy")]
/// [`StationTimer`] backed by the embassy time driver.
pub struct EmbassyTimer;

#[cfg(feature = "embassy")]
impl StationTimer for EmbassyTimer {
    async fn delay_ms(&mut self, millis: u32) {
        embassy_time::Timer::after(embassy_time::Duration::from_millis(millis as u64)).await;
    }

    fn now_ms(&mut self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }
}
