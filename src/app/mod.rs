//! Application core: fan-control domain logic, zero direct I/O.
//!
//! The wireless control surface, the connectivity supervisor and the main
//! cycle live here.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod connectivity;
pub mod cycle;
pub mod events;
pub mod ports;
pub mod surface;
pub mod telemetry;
