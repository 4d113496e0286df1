//! Water-routing slave board firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod buttons;
pub mod case;
pub mod comms;
pub mod config;
pub mod devices;
pub mod diagnostics;
pub mod error;
pub mod sync;

pub mod pins;

pub mod adapters;
pub mod drivers;
