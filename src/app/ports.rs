//! Port traits: the hexagonal boundary between case logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ CaseOrchestrator (domain)
//! ```
//!
//! Driven adapters (actuators, indicators, tank levels, peer link, event
//! sinks, storage) implement these traits. The
//! [`CaseOrchestrator`](super::service::CaseOrchestrator) consumes them via
//! generics, so the domain core never touches hardware directly.

use crate::buttons::ButtonId;
use crate::case::{SystemCase, TankState};
use crate::config::SystemConfig;
use crate::devices::{Pump, Valve};
use crate::diagnostics::ErrorLog;
use crate::error::Result;

// ───────────────────────────────────────────────────────────────
// Clock (monotonic time + blocking delay)
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock shared by every bounded wait.
pub trait Clock {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Block the calling task for `ms` milliseconds.
    fn sleep_ms(&self, ms: u32);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn sleep_ms(&self, ms: u32) {
        (**self).sleep_ms(ms);
    }
}

// ───────────────────────────────────────────────────────────────
// Device port (driven adapter: domain → valves / pumps)
// ───────────────────────────────────────────────────────────────

/// Electrovalve and pump executors as seen by the orchestrator.
pub trait DevicePort {
    /// Command one valve; records target state and timestamp.
    fn set_valve(&mut self, valve: Valve, on: bool) -> Result<()>;

    /// Whether the valve still draws "moving" current.
    fn is_turning(&mut self, valve: Valve) -> Result<bool>;

    /// Command one pump.
    fn set_pump(&mut self, pump: Pump, on: bool) -> Result<()>;

    /// Whether the pump draws "running" current (or, without a sense
    /// channel, whether it was last commanded on).
    fn is_pumping(&mut self, pump: Pump) -> Result<bool>;

    /// Cached commanded states and current readings, for telemetry.
    fn snapshot(&self) -> super::events::ActuatorSnapshot;
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → button LEDs)
// ───────────────────────────────────────────────────────────────

pub trait IndicatorPort {
    /// Steady pattern of `case`.
    fn set_case_indicators(&mut self, case: SystemCase) -> Result<()>;

    /// Pattern shown while a case change is in progress.
    fn set_transitioning_indicators(&mut self) -> Result<()>;

    /// Hood LED.
    fn set_aux_indicator(&mut self, on: bool) -> Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Tank level port (driven adapter: level acquisition → domain)
// ───────────────────────────────────────────────────────────────

pub trait TankLevelPort {
    fn tank_state(&self) -> TankState;
}

// ───────────────────────────────────────────────────────────────
// Peer link (driven adapter: domain ↔ main board)
// ───────────────────────────────────────────────────────────────

/// Commands exchanged with the peer board.
///
/// The orchestrator only ever sends [`PeerCommand::SetHood`]; the other
/// variants arrive from the peer and are routed by the comms task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PeerCommand {
    /// Switch the hood on or off.
    SetHood(bool),
    /// Bench override of a button level, any button.
    SimulateButton { button: ButtonId, pressed: bool },
    /// Level of an unwired button.
    VirtualButton { button: ButtonId, pressed: bool },
    /// Fresh tank flags sampled by the peer.
    TankState(TankState),
    /// Apply a case directly.
    RequestCase(SystemCase),
}

pub trait PeerLink {
    /// Send and wait for an acknowledgement, retrying a bounded number of
    /// times. Fails with `CommunicationFailure` once retries are exhausted.
    fn send_command_with_ack(&mut self, cmd: PeerCommand) -> Result<()>;

    /// Attempts that timed out waiting for an acknowledgement since the
    /// previous call, whether or not a later attempt succeeded.
    fn take_ack_timeouts(&mut self) -> u8;

    /// Update the case shown in the periodic state broadcast.
    fn publish_case(&mut self, case: SystemCase);

    /// Update the hood state shown in the periodic state broadcast.
    fn publish_aux_state(&mut self, on: bool);

    /// Update the error statistics and recent reports shown in the periodic
    /// state broadcast.
    fn publish_health(&mut self, log: &ErrorLog);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST run [`SystemConfig::validate`] before persisting
/// and reject invalid values rather than clamping them.
pub trait ConfigPort {
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> core::result::Result<SystemConfig, ConfigError>;

    fn save(&self, config: &SystemConfig) -> core::result::Result<(), ConfigError>;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
