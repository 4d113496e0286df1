//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules of the water-routing board:
//! the case transition rule, the apply sequence with its settle wait, the
//! inactivity watchdog and the hood relay. All interaction with hardware
//! happens through **port traits** defined in [`ports`], keeping this
//! layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
