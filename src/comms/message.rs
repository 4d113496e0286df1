//! Peer link messages.
//!
//! Every frame carries one postcard-encoded [`PeerMessage`]. Commands are
//! answered with an `Ack` or `Nack` echoing their sequence number; state
//! snapshots are fire-and-forget.
//!
//! | Body      | Direction   | Reply        |
//! |-----------|-------------|--------------|
//! | `Command` | both        | `Ack`/`Nack` |
//! | `Ack`     | both        | none         |
//! | `Nack`    | both        | none         |
//! | `State`   | board → peer| none         |

use serde::{Deserialize, Serialize};

use crate::app::ports::PeerCommand;
use crate::case::{SystemCase, TankState};
use crate::diagnostics::{ErrorStats, RecentReports};
use crate::error::{BusError, Error, Result};

use super::codec::{HEADER_SIZE, MAX_FRAME_SIZE, encode_frame};

/// Largest encoded frame, header included.
pub const MAX_WIRE_SIZE: usize = HEADER_SIZE + MAX_FRAME_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerMessage {
    pub seq: u16,
    pub body: MessageBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageBody {
    Command(PeerCommand),
    Ack { command_seq: u16 },
    Nack { command_seq: u16, code: u16 },
    State(StateSnapshot),
}

/// What the board publishes about itself once per broadcast period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub case: SystemCase,
    pub hood_on: bool,
    pub tank: TankState,
    pub uptime_ms: u64,
    pub errors: ErrorStats,
    pub recent_errors: RecentReports,
}

impl PeerMessage {
    pub const fn command(seq: u16, cmd: PeerCommand) -> Self {
        Self {
            seq,
            body: MessageBody::Command(cmd),
        }
    }

    /// Serialize and frame into `out`. Returns the frame length.
    pub fn encode(&self, out: &mut [u8; MAX_WIRE_SIZE]) -> Result<usize> {
        let mut payload = [0u8; MAX_FRAME_SIZE];
        let body = postcard::to_slice(self, &mut payload)
            .map_err(|_| Error::InvalidArgument("peer message too large"))?;
        encode_frame(body, out).ok_or(Error::InvalidArgument("peer message too large"))
    }

    /// Parse one frame payload.
    pub fn decode(payload: &[u8]) -> Result<Self> {
        postcard::from_bytes(payload).map_err(|_| Error::Bus(BusError::Transport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buttons::ButtonId;
    use crate::comms::codec::FrameDecoder;
    use crate::diagnostics::{ErrorReport, RECENT_SLOTS};

    #[test]
    fn command_survives_the_wire() {
        let msg = PeerMessage::command(
            7,
            PeerCommand::SimulateButton {
                button: ButtonId::Bd1,
                pressed: true,
            },
        );
        let mut wire = [0u8; MAX_WIRE_SIZE];
        let n = msg.encode(&mut wire).unwrap();

        let mut dec = FrameDecoder::new();
        let (_, frame) = dec.feed(&wire[..n]);
        assert_eq!(PeerMessage::decode(frame.unwrap()).unwrap(), msg);
    }

    #[test]
    fn full_snapshot_fits_one_frame() {
        let msg = PeerMessage {
            seq: u16::MAX,
            body: MessageBody::State(StateSnapshot {
                case: SystemCase::P1,
                hood_on: true,
                tank: TankState::DIRTY_FULL | TankState::RECYCLED_EMPTY,
                uptime_ms: u64::MAX,
                errors: ErrorStats {
                    total: u32::MAX,
                    by_severity: [u32::MAX; 4],
                    by_category: [u32::MAX; 4],
                    last_code: 0x4002,
                    last_timestamp_ms: u64::MAX,
                },
                recent_errors: [Some(ErrorReport {
                    code: 0x4002,
                    severity: crate::error::Severity::Critical,
                    category: crate::error::Category::Communication,
                    timestamp_ms: u64::MAX,
                }); RECENT_SLOTS],
            }),
        };
        let mut wire = [0u8; MAX_WIRE_SIZE];
        assert!(msg.encode(&mut wire).is_ok());
    }

    #[test]
    fn garbage_payload_is_a_transport_error() {
        assert_eq!(
            PeerMessage::decode(&[0x01]),
            Err(Error::Bus(BusError::Transport))
        );
    }
}
