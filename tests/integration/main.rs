//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises a subsystem against
//! mock adapters. All tests run on the host with no hardware attached.

mod case_tests;
mod comms_tests;
mod mock_hw;
