//! Station transport: hardware abstraction traits, edge timing for
//! frequency-output sensors, and the bounded report sender.
pub mod transport;
