//! Outbound application events.
//!
//! The [`CaseOrchestrator`](super::service::CaseOrchestrator) emits these
//! through the [`EventSink`](super::ports::EventSink) port. Adapters on the
//! other side decide what to do with them: log to serial, forward to the
//! peer board, count them.

use crate::case::{SystemCase, TankState};
use crate::diagnostics::ErrorReport;
use crate::drivers::shift_register::OutputImage;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The orchestrator has started (carries the initial case).
    Started(SystemCase),

    /// A case change completed.
    CaseChanged { from: SystemCase, to: SystemCase },

    /// The compatibility guard refused a case.
    CaseRejected { target: SystemCase, tank: TankState },

    /// Valves were still drawing current when the settle bound elapsed.
    SettleTimeout { target: SystemCase },

    /// Hood state changed (acknowledged by, or requested from, the peer).
    AuxChanged(bool),

    /// The inactivity watchdog is forcing RST.
    AutoReset { from: SystemCase, idle_ms: u64 },

    /// Any recoverable error, after it was recorded.
    Fault(ErrorReport),

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),
}

/// Last commanded state and last current reading of every actuator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActuatorSnapshot {
    pub valves_open: [bool; 6],
    pub valves_ma: [f32; 6],
    pub pumps_on: [bool; 4],
    pub pumps_ma: [f32; 4],
    /// PV above its water threshold at the last sample.
    pub pv_water: bool,
    /// Output chain image at the last sample.
    pub output_image: OutputImage,
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryData {
    pub case: SystemCase,
    pub hood_on: bool,
    pub tank: TankState,
    pub actuators: ActuatorSnapshot,
    pub error_total: u32,
    pub uptime_ms: u64,
}
