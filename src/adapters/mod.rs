//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements         | Connects to                  |
//! |---------------|--------------------|------------------------------|
//! | `hardware`    | DevicePort         | Valve / pump executors       |
//! |               | IndicatorPort      | Button LEDs on the chain     |
//! | `log_sink`    | EventSink          | Serial log output            |
//! | `nvs`         | ConfigPort         | NVS / in-memory blob         |
//! | `tank_levels` | TankLevelPort      | Flags pushed by the peer     |
//! | `time`        | Clock              | ESP32 system timer           |
//! | `uart`        | Transport          | UART to the peer board       |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod tank_levels;
pub mod time;
#[cfg(target_os = "espidf")]
pub mod uart;
