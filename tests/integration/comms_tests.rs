//! Peer link end to end: orchestrator handle ↔ channels ↔ comms task ↔
//! transport ↔ a scripted peer board.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use vanwater::adapters::tank_levels::SharedTankState;
use vanwater::adapters::time::SystemClock;
use vanwater::app::ports::{PeerCommand, PeerLink, TankLevelPort};
use vanwater::buttons::ButtonId;
use vanwater::case::{SystemCase, TankState};
use vanwater::comms::codec::FrameDecoder;
use vanwater::comms::link::{PeerChannels, PeerHandle};
use vanwater::comms::message::{MAX_WIRE_SIZE, MessageBody, PeerMessage};
use vanwater::comms::task::PeerComms;
use vanwater::comms::transport::Transport;
use vanwater::config::SystemConfig;
use vanwater::drivers::button::ButtonFlags;

// ── Scripted peer board ───────────────────────────────────────

/// Acks every command it receives (when `acking`) and records all
/// messages written by the comms task.
struct PeerBoard {
    decoder: FrameDecoder,
    inbound: VecDeque<u8>,
    seen: Arc<Mutex<Vec<PeerMessage>>>,
    acking: bool,
}

impl PeerBoard {
    fn new(acking: bool) -> (Self, Arc<Mutex<Vec<PeerMessage>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let board = Self {
            decoder: FrameDecoder::new(),
            inbound: VecDeque::new(),
            seen: seen.clone(),
            acking,
        };
        (board, seen)
    }

    fn queue(&mut self, msg: &PeerMessage) {
        let mut wire = [0u8; MAX_WIRE_SIZE];
        let n = msg.encode(&mut wire).unwrap();
        self.inbound.extend(&wire[..n]);
    }
}

impl Transport for PeerBoard {
    type Error = ();

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ()> {
        let n = buf.len().min(self.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(self.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        let mut rest = data;
        while !rest.is_empty() {
            let (used, frame) = self.decoder.feed(rest);
            let msg = frame.map(|f| PeerMessage::decode(f).unwrap());
            rest = &rest[used..];
            if let Some(msg) = msg {
                if let MessageBody::Command(_) = msg.body {
                    if self.acking {
                        self.queue(&PeerMessage {
                            seq: 1000,
                            body: MessageBody::Ack {
                                command_seq: msg.seq,
                            },
                        });
                    }
                }
                self.seen.lock().unwrap().push(msg);
            }
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }
}

fn fast_config() -> SystemConfig {
    SystemConfig {
        peer_ack_timeout_ms: 200,
        peer_retry_delay_ms: 10,
        ..SystemConfig::default()
    }
}

/// Run the comms task on its own thread until `stop` is raised.
fn spawn_comms(
    board: PeerBoard,
    channels: Arc<PeerChannels>,
    stop: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut comms = PeerComms::new(board, SystemClock::new(), channels, 50);
        while !stop.load(Ordering::Relaxed) {
            comms.poll().unwrap();
            thread::sleep(std::time::Duration::from_millis(1));
        }
    })
}

#[test]
fn hood_command_round_trip() {
    let channels = PeerChannels::new();
    let stop = Arc::new(AtomicBool::new(false));
    let (board, seen) = PeerBoard::new(true);
    let task = spawn_comms(board, channels.clone(), stop.clone());

    let mut peer = PeerHandle::new(channels, SystemClock::new(), &fast_config());
    let result = peer.send_command_with_ack(PeerCommand::SetHood(true));

    stop.store(true, Ordering::Relaxed);
    task.join().unwrap();

    assert!(result.is_ok());
    let seen = seen.lock().unwrap();
    let commands: Vec<_> = seen
        .iter()
        .filter_map(|m| match m.body {
            MessageBody::Command(cmd) => Some(cmd),
            _ => None,
        })
        .collect();
    assert_eq!(commands, vec![PeerCommand::SetHood(true)]);
}

#[test]
fn silent_peer_gets_every_retry() {
    let channels = PeerChannels::new();
    let stop = Arc::new(AtomicBool::new(false));
    let (board, seen) = PeerBoard::new(false);
    let task = spawn_comms(board, channels.clone(), stop.clone());

    let config = fast_config();
    let mut peer = PeerHandle::new(channels, SystemClock::new(), &config);
    let result = peer.send_command_with_ack(PeerCommand::SetHood(false));

    // let the last attempt reach the wire
    thread::sleep(std::time::Duration::from_millis(20));
    stop.store(true, Ordering::Relaxed);
    task.join().unwrap();

    assert_eq!(result, Err(vanwater::error::Error::CommunicationFailure));
    assert_eq!(peer.take_ack_timeouts(), config.peer_max_retries);
    let seen = seen.lock().unwrap();
    let attempts: Vec<u16> = seen
        .iter()
        .filter(|m| matches!(m.body, MessageBody::Command(_)))
        .map(|m| m.seq)
        .collect();
    assert_eq!(attempts.len(), usize::from(config.peer_max_retries));
    assert!(attempts.iter().all(|s| *s == attempts[0]), "retries reuse the sequence");
}

#[test]
fn inbound_commands_are_routed() {
    let channels = PeerChannels::new();
    let (mut board, seen) = PeerBoard::new(true);
    board.queue(&PeerMessage::command(
        1,
        PeerCommand::TankState(TankState::CLEAN_EMPTY),
    ));
    board.queue(&PeerMessage::command(
        2,
        PeerCommand::SimulateButton {
            button: ButtonId::Be2,
            pressed: true,
        },
    ));
    board.queue(&PeerMessage::command(
        3,
        PeerCommand::VirtualButton {
            button: ButtonId::Bv1,
            pressed: true,
        },
    ));
    board.queue(&PeerMessage::command(4, PeerCommand::RequestCase(SystemCase::V1)));

    let tank = SharedTankState::new();
    let simulated = ButtonFlags::new();
    let virtual_flags = ButtonFlags::new();
    let requested = Arc::new(Mutex::new(Vec::new()));

    let mut comms = PeerComms::new(board, SystemClock::new(), channels, 1000)
        .with_buttons(simulated.clone(), virtual_flags.clone())
        .with_tank_state(tank.clone());
    let sink = requested.clone();
    comms.register_command_callback(move |cmd| {
        sink.lock().unwrap().push(cmd);
        true
    });
    comms.poll().unwrap();

    assert_eq!(tank.tank_state(), TankState::CLEAN_EMPTY);
    assert!(simulated.is_set(ButtonId::Be2));
    assert!(virtual_flags.is_set(ButtonId::Bv1));
    assert_eq!(
        *requested.lock().unwrap(),
        vec![PeerCommand::RequestCase(SystemCase::V1)]
    );

    let seen = seen.lock().unwrap();
    let acked: Vec<u16> = seen
        .iter()
        .filter_map(|m| match m.body {
            MessageBody::Ack { command_seq } => Some(command_seq),
            _ => None,
        })
        .collect();
    assert_eq!(acked, vec![1, 2, 3, 4]);
    assert!(
        seen.iter().any(|m| matches!(m.body, MessageBody::State(s) if s.tank == TankState::CLEAN_EMPTY)),
        "first poll broadcasts the snapshot"
    );
}
