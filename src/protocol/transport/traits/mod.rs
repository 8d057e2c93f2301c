//! Abstraction traits consumed by the acquisition core (register bus, digital
//! lines, stream transport, and timer).
pub mod byte_stream;
pub mod digital_line;
pub mod register_bus;
pub mod station_timer;
