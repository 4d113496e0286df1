//! Comms task: the transport side of the peer link.
//!
//! Each [`PeerComms::poll`] reads whatever the transport has, decodes and
//! dispatches complete frames, flushes the outbox and, once per period,
//! broadcasts the state snapshot.
//!
//! Inbound commands are routed by kind:
//!
//! | Command          | Destination                         |
//! |------------------|-------------------------------------|
//! | `SimulateButton` | simulated button flags              |
//! | `VirtualButton`  | virtual button flags                |
//! | `TankState`      | shared tank state                   |
//! | anything else    | registered command callback         |
//!
//! A command nobody handles is answered with a `Nack`.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::adapters::tank_levels::SharedTankState;
use crate::app::ports::{Clock, PeerCommand};
use crate::drivers::button::ButtonFlags;
use crate::error::{BusError, Error, Result};

use super::codec::FrameDecoder;
use super::link::{AckMsg, PeerChannels};
use super::message::{MAX_WIRE_SIZE, MessageBody, PeerMessage};
use super::transport::Transport;

/// Bytes pulled from the transport per read.
const READ_CHUNK: usize = 64;

/// Status code carried by a `Nack` for an unhandled command.
const NACK_UNHANDLED: u16 = 0x1001;

pub type CommandCallback = Box<dyn FnMut(PeerCommand) -> bool + Send>;

pub struct PeerComms<T, K> {
    transport: T,
    clock: K,
    channels: Arc<PeerChannels>,
    decoder: FrameDecoder,
    simulated: Option<ButtonFlags>,
    virtual_flags: Option<ButtonFlags>,
    tank: Option<SharedTankState>,
    on_command: Option<CommandCallback>,
    state_period_ms: u64,
    last_state_ms: Option<u64>,
    started_ms: u64,
}

impl<T: Transport, K: Clock> PeerComms<T, K> {
    pub fn new(transport: T, clock: K, channels: Arc<PeerChannels>, state_period_ms: u32) -> Self {
        let started_ms = clock.now_ms();
        Self {
            transport,
            clock,
            channels,
            decoder: FrameDecoder::new(),
            simulated: None,
            virtual_flags: None,
            tank: None,
            on_command: None,
            state_period_ms: u64::from(state_period_ms),
            last_state_ms: None,
            started_ms,
        }
    }

    /// Route button commands into the classifier's flag sources.
    pub fn with_buttons(mut self, simulated: ButtonFlags, virtual_flags: ButtonFlags) -> Self {
        self.simulated = Some(simulated);
        self.virtual_flags = Some(virtual_flags);
        self
    }

    pub fn with_tank_state(mut self, tank: SharedTankState) -> Self {
        self.tank = Some(tank);
        self
    }

    /// Register the handler for commands not routed elsewhere. Returning
    /// `false` answers the peer with a `Nack`.
    pub fn register_command_callback(
        &mut self,
        callback: impl FnMut(PeerCommand) -> bool + Send + 'static,
    ) {
        self.on_command = Some(Box::new(callback));
    }

    /// One service pass. Call at the comms task period.
    pub fn poll(&mut self) -> Result<()> {
        self.receive()?;
        self.flush_outbox()?;

        let now = self.clock.now_ms();
        let due = self
            .last_state_ms
            .is_none_or(|last| now.saturating_sub(last) >= self.state_period_ms);
        if due {
            self.last_state_ms = Some(now);
            self.broadcast_state(now)?;
        }
        Ok(())
    }

    fn receive(&mut self) -> Result<()> {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let n = self
                .transport
                .read(&mut buf)
                .map_err(|e| {
                    warn!("peer: read failed: {:?}", e);
                    Error::Bus(BusError::Transport)
                })?;
            if n == 0 {
                return Ok(());
            }

            let mut rest = &buf[..n];
            while !rest.is_empty() {
                let (used, frame) = self.decoder.feed(rest);
                let decoded = frame.map(PeerMessage::decode);
                rest = &rest[used..];
                match decoded {
                    Some(Ok(msg)) => self.handle_message(msg)?,
                    Some(Err(e)) => warn!("peer: undecodable frame: {}", e),
                    None => {}
                }
            }
        }
    }

    fn handle_message(&mut self, msg: PeerMessage) -> Result<()> {
        match msg.body {
            MessageBody::Command(cmd) => {
                info!("peer: command {:?} (seq {})", cmd, msg.seq);
                let body = if self.dispatch(cmd) {
                    MessageBody::Ack {
                        command_seq: msg.seq,
                    }
                } else {
                    MessageBody::Nack {
                        command_seq: msg.seq,
                        code: NACK_UNHANDLED,
                    }
                };
                let seq = self.channels.next_seq();
                self.send(&PeerMessage { seq, body })
            }
            MessageBody::Ack { command_seq } => {
                self.route_ack(command_seq, true);
                Ok(())
            }
            MessageBody::Nack { command_seq, code } => {
                warn!("peer: nack for {} (0x{:04X})", command_seq, code);
                self.route_ack(command_seq, false);
                Ok(())
            }
            MessageBody::State(_) => {
                warn!("peer: unexpected state message");
                Ok(())
            }
        }
    }

    fn dispatch(&mut self, cmd: PeerCommand) -> bool {
        match cmd {
            PeerCommand::SimulateButton { button, pressed } => match &self.simulated {
                Some(flags) => {
                    flags.set(button, pressed);
                    true
                }
                None => false,
            },
            PeerCommand::VirtualButton { button, pressed } => match &self.virtual_flags {
                Some(flags) if !button.is_physical() => {
                    flags.set(button, pressed);
                    true
                }
                _ => false,
            },
            PeerCommand::TankState(state) => match &self.tank {
                Some(tank) => {
                    tank.set(state);
                    true
                }
                None => false,
            },
            other => match self.on_command.as_mut() {
                Some(callback) => callback(other),
                None => false,
            },
        }
    }

    fn route_ack(&self, command_seq: u16, accepted: bool) {
        let ack = AckMsg {
            command_seq,
            accepted,
        };
        if self.channels.acks.try_send(ack).is_err() {
            debug!("peer: ack queue full, dropping ack {}", command_seq);
        }
    }

    fn flush_outbox(&mut self) -> Result<()> {
        while let Ok(msg) = self.channels.outbox.try_receive() {
            self.send(&msg)?;
        }
        Ok(())
    }

    fn broadcast_state(&mut self, now: u64) -> Result<()> {
        let mut snapshot = self.channels.snapshot();
        snapshot.uptime_ms = now.saturating_sub(self.started_ms);
        if let Some(tank) = &self.tank {
            snapshot.tank = tank.get();
        }
        let seq = self.channels.next_seq();
        self.send(&PeerMessage {
            seq,
            body: MessageBody::State(snapshot),
        })
    }

    fn send(&mut self, msg: &PeerMessage) -> Result<()> {
        let mut wire = [0u8; MAX_WIRE_SIZE];
        let n = msg.encode(&mut wire)?;
        self.transport
            .write_all(&wire[..n])
            .and_then(|()| self.transport.flush())
            .map_err(|e| {
                warn!("peer: write failed: {:?}", e);
                Error::Bus(BusError::Transport)
            })
    }
}
