//! Fan control: speed ↔ duty conversion and the authoritative actuator
//! state shared between the wireless write path and the main cycle.

pub mod actuator;
pub mod duty;

pub use actuator::ActuatorState;
pub use duty::DutyCycleMapper;
