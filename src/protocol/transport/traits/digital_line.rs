//! Digital lines used by the frequency-output sensors: an edge-timestamping
//! input and a gain-control output.
use core::future::Future;

/// Digital input able to timestamp its level transitions.
///
/// On hardware this maps onto an input-capture timer channel or an edge
/// interrupt reading a free-running counter.
pub trait PulseInput {
    /// Frequency of the tick counter used for edge timestamps.
    fn ticks_per_second(&self) -> u64;

    /// Wait for the next level transition (either direction) and return its
    /// timestamp in ticks.
    fn wait_for_edge<'a>(&'a mut self) -> impl Future<Output = u64> + 'a;
}

/// Push-pull output selecting a sensor's gain range.
pub trait GainControl {
    fn set_high(&mut self);
    fn set_low(&mut self);
    /// Level currently driven on the line.
    fn is_set_high(&self) -> bool;
}
