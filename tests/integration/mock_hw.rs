//! Mock adapters for integration tests.
//!
//! Records every device and indicator call so tests can assert on the
//! full command history without touching the output chain or the current
//! front end. Time is a shared manual clock that only moves when someone
//! sleeps on it or a test advances it.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use vanwater::app::events::{ActuatorSnapshot, AppEvent};
use vanwater::app::ports::{Clock, DevicePort, EventSink, IndicatorPort, PeerCommand, PeerLink};
use vanwater::case::SystemCase;
use vanwater::devices::{Pump, Valve};
use vanwater::diagnostics::{ErrorLog, ErrorStats, RecentReports};
use vanwater::error::{Error, Result};

// ── MockClock ─────────────────────────────────────────────────

/// Manual clock; clones share the same time.
#[derive(Clone, Default)]
pub struct MockClock(Rc<Cell<u64>>);

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }

    fn sleep_ms(&self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

// ── Device call record ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCall {
    Valve(Valve, bool),
    Pump(Pump, bool),
    CaseLeds(SystemCase),
    TransitionLeds,
    HoodLed(bool),
}

// ── MockDevices ───────────────────────────────────────────────

pub struct MockDevices {
    pub calls: Vec<DeviceCall>,
    pub valves: [bool; 6],
    pub pumps: [bool; 4],
    clock: MockClock,
    /// Time a commanded valve keeps drawing current. `None`: forever.
    pub valve_travel_ms: Option<u64>,
    moving_until_ms: u64,
    /// Whether a running PE actually draws current.
    pub pe_flowing: bool,
    pub turning_polls: u32,
}

impl MockDevices {
    pub fn new(clock: MockClock) -> Self {
        Self {
            calls: Vec::new(),
            valves: [false; 6],
            pumps: [false; 4],
            clock,
            valve_travel_ms: Some(300),
            moving_until_ms: 0,
            pe_flowing: true,
            turning_polls: 0,
        }
    }

    pub fn valve_on(&self, valve: Valve) -> bool {
        self.valves[valve.index()]
    }

    pub fn pump_on(&self, pump: Pump) -> bool {
        self.pumps[pump.index()]
    }

    /// Valve and pump commands only.
    pub fn output_calls(&self) -> Vec<DeviceCall> {
        self.calls
            .iter()
            .copied()
            .filter(|c| matches!(c, DeviceCall::Valve(..) | DeviceCall::Pump(..)))
            .collect()
    }

    pub fn pump_ever_on(&self) -> bool {
        self.calls
            .iter()
            .any(|c| matches!(c, DeviceCall::Pump(_, true)))
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl DevicePort for MockDevices {
    fn set_valve(&mut self, valve: Valve, on: bool) -> Result<()> {
        self.calls.push(DeviceCall::Valve(valve, on));
        if self.valves[valve.index()] != on {
            self.moving_until_ms = match self.valve_travel_ms {
                Some(travel) => self.clock.now_ms() + travel,
                None => u64::MAX,
            };
        }
        self.valves[valve.index()] = on;
        Ok(())
    }

    fn is_turning(&mut self, _valve: Valve) -> Result<bool> {
        self.turning_polls += 1;
        Ok(self.clock.now_ms() < self.moving_until_ms)
    }

    fn set_pump(&mut self, pump: Pump, on: bool) -> Result<()> {
        self.calls.push(DeviceCall::Pump(pump, on));
        self.pumps[pump.index()] = on;
        Ok(())
    }

    fn is_pumping(&mut self, pump: Pump) -> Result<bool> {
        let on = self.pumps[pump.index()];
        Ok(match pump {
            Pump::Pe => on && self.pe_flowing,
            _ => on,
        })
    }

    fn snapshot(&self) -> ActuatorSnapshot {
        ActuatorSnapshot {
            valves_open: self.valves,
            pumps_on: self.pumps,
            ..ActuatorSnapshot::default()
        }
    }
}

impl IndicatorPort for MockDevices {
    fn set_case_indicators(&mut self, case: SystemCase) -> Result<()> {
        self.calls.push(DeviceCall::CaseLeds(case));
        Ok(())
    }

    fn set_transitioning_indicators(&mut self) -> Result<()> {
        self.calls.push(DeviceCall::TransitionLeds);
        Ok(())
    }

    fn set_aux_indicator(&mut self, on: bool) -> Result<()> {
        self.calls.push(DeviceCall::HoodLed(on));
        Ok(())
    }
}

// ── MockPeer ──────────────────────────────────────────────────

/// A silent peer times out `retries` attempts per command.
pub struct MockPeer {
    pub acks: bool,
    pub retries: u8,
    pub sent: Vec<PeerCommand>,
    pub case: Option<SystemCase>,
    pub hood: Option<bool>,
    pub health: Option<ErrorStats>,
    pub recent: RecentReports,
    timed_out: u8,
}

impl MockPeer {
    pub fn new() -> Self {
        Self {
            acks: true,
            retries: 3,
            sent: Vec::new(),
            case: None,
            hood: None,
            health: None,
            recent: RecentReports::default(),
            timed_out: 0,
        }
    }

    pub fn silent() -> Self {
        Self {
            acks: false,
            ..Self::new()
        }
    }
}

impl Default for MockPeer {
    fn default() -> Self {
        Self::new()
    }
}

impl PeerLink for MockPeer {
    fn send_command_with_ack(&mut self, cmd: PeerCommand) -> Result<()> {
        self.sent.push(cmd);
        if self.acks {
            Ok(())
        } else {
            self.timed_out = self.timed_out.saturating_add(self.retries);
            Err(Error::CommunicationFailure)
        }
    }

    fn take_ack_timeouts(&mut self) -> u8 {
        std::mem::take(&mut self.timed_out)
    }

    fn publish_case(&mut self, case: SystemCase) {
        self.case = Some(case);
    }

    fn publish_aux_state(&mut self, on: bool) {
        self.hood = Some(on);
    }

    fn publish_health(&mut self, log: &ErrorLog) {
        self.health = Some(*log.stats());
        self.recent = log.recent_reports();
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
