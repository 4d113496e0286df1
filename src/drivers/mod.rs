//! Output chain, current sensing, actuator executors and button input.

pub mod button;
pub mod current_sensor;
pub mod electrovalve;
pub mod executor;
pub mod gesture;
pub mod indicators;
pub mod pump;
pub mod shift_register;
