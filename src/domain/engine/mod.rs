//! Engine module - lifecycle of one inbound turn inside the driver.

mod phase;

pub use phase::DriverPhase;
