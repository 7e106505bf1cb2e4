//! Low-level peripheral drivers.

pub mod hw_init;
