//! Unified error types for the water-routing firmware.
//!
//! Every fallible operation funnels into the single [`Error`] enum so the
//! orchestrator, the peer link and the drivers share one handling path.
//! All variants are `Copy`; they travel through the error log and the
//! peer snapshot without allocation.
//!
//! None of these errors is fatal. Callers log them, record them in the
//! [`ErrorLog`](crate::diagnostics::ErrorLog) and keep running in the last
//! known-good case.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::case::{SystemCase, TankState};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Unknown device, case, button or channel identifier.
    InvalidArgument(&'static str),
    /// The compatibility guard rejected a transition.
    IncompatibleCase { target: SystemCase, tank: TankState },
    /// A bounded wait expired.
    Timeout(TimeoutKind),
    /// The peer never acknowledged a command within its retries.
    CommunicationFailure,
    /// A hardware bus transaction failed.
    Bus(BusError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(what) => write!(f, "invalid argument: {what}"),
            Self::IncompatibleCase { target, tank } => {
                write!(f, "case {target} incompatible with tank state {tank}")
            }
            Self::Timeout(kind) => write!(f, "timeout: {kind}"),
            Self::CommunicationFailure => write!(f, "peer did not acknowledge"),
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Numeric code published in error reports and peer snapshots.
    pub const fn code(&self) -> u16 {
        match self {
            Self::InvalidArgument(_) => 0x1001,
            Self::Config(_) => 0x1002,
            Self::CommunicationFailure => 0x2001,
            Self::Bus(_) => 0x2002,
            Self::Timeout(_) => 0x2004,
            Self::IncompatibleCase { .. } => 0x4002,
        }
    }

    pub const fn severity(&self) -> Severity {
        match self {
            Self::InvalidArgument(_) | Self::IncompatibleCase { .. } => Severity::Warning,
            Self::Timeout(_) | Self::CommunicationFailure | Self::Config(_) => Severity::Error,
            Self::Bus(_) => Severity::Critical,
        }
    }

    pub const fn category(&self) -> Category {
        match self {
            Self::InvalidArgument(_) | Self::Config(_) => Category::System,
            Self::CommunicationFailure => Category::Communication,
            Self::Bus(_) => Category::Hardware,
            Self::Timeout(TimeoutKind::PeerAck) => Category::Communication,
            Self::Timeout(_) => Category::Hardware,
            Self::IncompatibleCase { .. } => Category::Case,
        }
    }
}

// ---------------------------------------------------------------------------
// Timeouts
// ---------------------------------------------------------------------------

/// Which bounded wait expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeoutKind {
    /// Exclusive ownership of the output chain was not granted in time.
    OutputChain,
    /// Exclusive ownership of the current-sense front end was not granted in time.
    CurrentSense,
    /// Valves still drew current when the settle bound elapsed.
    ValveSettle,
    /// An acknowledgement from the peer did not arrive in time.
    PeerAck,
}

impl fmt::Display for TimeoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutputChain => write!(f, "output chain lock"),
            Self::CurrentSense => write!(f, "current sense lock"),
            Self::ValveSettle => write!(f, "valve settle"),
            Self::PeerAck => write!(f, "peer acknowledgement"),
        }
    }
}

impl From<TimeoutKind> for Error {
    fn from(kind: TimeoutKind) -> Self {
        Self::Timeout(kind)
    }
}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// An I2C transaction to the measurement chip or multiplexer failed.
    I2c,
    /// Driving a shift-register control line failed.
    Gpio,
    /// Peer transport read or write failed.
    Transport,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I2c => write!(f, "I2C transaction failed"),
            Self::Gpio => write!(f, "GPIO write failed"),
            Self::Transport => write!(f, "transport I/O failed"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Severity {
    Info = 0,
    Warning = 1,
    Error = 2,
    Critical = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Category {
    System = 0,
    Communication = 1,
    Hardware = 2,
    Case = 3,
}

impl Severity {
    pub const COUNT: usize = 4;
}

impl Category {
    pub const COUNT: usize = 4;
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
