//! Inbound commands to the case orchestrator.
//!
//! These represent actions requested by the outside world (button task,
//! peer board) that the
//! [`CaseOrchestrator`](super::service::CaseOrchestrator) interprets and
//! acts upon. Each producer holds a sender of one shared channel; the
//! orchestrator task is the only receiver.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::buttons::ButtonEvent;
use crate::case::SystemCase;

/// Depth of the orchestrator's command queue.
pub const COMMAND_DEPTH: usize = 16;

/// Shared by every producer and the orchestrator task.
pub type CommandChannel = Channel<CriticalSectionRawMutex, AppCommand, COMMAND_DEPTH>;

/// Commands that producers can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// A classified click from the button task.
    Click(ButtonEvent),

    /// Peer-originated hood state (already applied on the peer side).
    SetAux(bool),

    /// Apply a case directly (peer request or bench testing). Still
    /// subject to the compatibility guard.
    RequestCase(SystemCase),
}
