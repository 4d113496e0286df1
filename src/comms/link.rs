//! Orchestrator side of the peer link.
//!
//! Bounded `embassy-sync` channels bridge the orchestrator task with the
//! comms task. The orchestrator never touches the transport; it queues
//! commands in the outbox and waits for the comms task to post the
//! matching acknowledgement.
//!
//! ```text
//! ┌──────────────┐  outbox (PeerMessage)  ┌──────────────┐
//! │ Orchestrator │──────────────────────▶│  Comms task  │──▶ Transport
//! │ (PeerHandle) │◀──────────────────────│ (PeerComms)  │◀──
//! └──────────────┘   acks (AckMsg)        └──────────────┘
//!          └──── snapshot cell (case, hood, errors) ───┘
//! ```

use core::cell::Cell;
use core::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, warn};

use crate::app::ports::{Clock, PeerCommand, PeerLink};
use crate::case::SystemCase;
use crate::config::SystemConfig;
use crate::diagnostics::ErrorLog;
use crate::error::{Error, Result};

use super::message::{PeerMessage, StateSnapshot};

/// Channel depth for outbound messages.
const OUTBOX_DEPTH: usize = 8;

/// Channel depth for acknowledgements.
const ACK_DEPTH: usize = 5;

/// Poll step while waiting for an acknowledgement.
const ACK_POLL_MS: u32 = 5;

/// Acknowledgement routed from the comms task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckMsg {
    pub command_seq: u16,
    pub accepted: bool,
}

/// State shared by both ends of the link.
pub struct PeerChannels {
    pub(crate) outbox: Channel<CriticalSectionRawMutex, PeerMessage, OUTBOX_DEPTH>,
    pub(crate) acks: Channel<CriticalSectionRawMutex, AckMsg, ACK_DEPTH>,
    snapshot: BlockingMutex<CriticalSectionRawMutex, Cell<StateSnapshot>>,
    sequence: AtomicU16,
}

impl PeerChannels {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            outbox: Channel::new(),
            acks: Channel::new(),
            snapshot: BlockingMutex::new(Cell::new(StateSnapshot::default())),
            sequence: AtomicU16::new(0),
        })
    }

    pub fn next_seq(&self) -> u16 {
        self.sequence.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.snapshot.lock(Cell::get)
    }

    pub fn update_snapshot(&self, f: impl FnOnce(&mut StateSnapshot)) {
        self.snapshot.lock(|cell| {
            let mut snap = cell.get();
            f(&mut snap);
            cell.set(snap);
        });
    }
}

/// The orchestrator's [`PeerLink`].
pub struct PeerHandle<K> {
    channels: Arc<PeerChannels>,
    clock: K,
    max_retries: u8,
    retry_delay_ms: u32,
    ack_timeout_ms: u32,
    ack_timeouts: u8,
}

impl<K: Clock> PeerHandle<K> {
    pub fn new(channels: Arc<PeerChannels>, clock: K, config: &SystemConfig) -> Self {
        Self {
            channels,
            clock,
            max_retries: config.peer_max_retries,
            retry_delay_ms: config.peer_retry_delay_ms,
            ack_timeout_ms: config.peer_ack_timeout_ms,
            ack_timeouts: 0,
        }
    }

    /// `Some(accepted)` for the ack of `seq`, `None` on timeout. Acks for
    /// other sequence numbers are stale and dropped.
    fn wait_for_ack(&self, seq: u16) -> Option<bool> {
        let start = self.clock.now_ms();
        loop {
            while let Ok(ack) = self.channels.acks.try_receive() {
                if ack.command_seq == seq {
                    return Some(ack.accepted);
                }
                debug!("peer: stale ack {} while waiting for {}", ack.command_seq, seq);
            }
            if self.clock.now_ms().saturating_sub(start) >= u64::from(self.ack_timeout_ms) {
                return None;
            }
            self.clock.sleep_ms(ACK_POLL_MS);
        }
    }
}

impl<K: Clock> PeerLink for PeerHandle<K> {
    fn send_command_with_ack(&mut self, cmd: PeerCommand) -> Result<()> {
        let seq = self.channels.next_seq();
        for attempt in 1..=self.max_retries {
            match self.channels.outbox.try_send(PeerMessage::command(seq, cmd)) {
                Ok(()) => match self.wait_for_ack(seq) {
                    Some(true) => return Ok(()),
                    Some(false) => warn!("peer: {:?} refused", cmd),
                    None => {
                        self.ack_timeouts = self.ack_timeouts.saturating_add(1);
                        warn!("peer: no ack for {:?} (seq {})", cmd, seq);
                    }
                },
                Err(_) => warn!("peer: outbox full"),
            }
            warn!("peer: command retry {}/{}", attempt, self.max_retries);
            self.clock.sleep_ms(self.retry_delay_ms);
        }
        Err(Error::CommunicationFailure)
    }

    fn take_ack_timeouts(&mut self) -> u8 {
        core::mem::take(&mut self.ack_timeouts)
    }

    fn publish_case(&mut self, case: SystemCase) {
        self.channels.update_snapshot(|s| s.case = case);
    }

    fn publish_aux_state(&mut self, on: bool) {
        self.channels.update_snapshot(|s| s.hood_on = on);
    }

    fn publish_health(&mut self, log: &ErrorLog) {
        let stats = *log.stats();
        let recent = log.recent_reports();
        self.channels.update_snapshot(|s| {
            s.errors = stats;
            s.recent_errors = recent;
        });
    }
}
