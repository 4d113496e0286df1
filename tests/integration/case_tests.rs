//! Integration tests for the click → orchestrator → outputs pipeline.
//!
//! Real transition rule, real tank-state cell, mock devices and peer.

use vanwater::adapters::nvs::NvsConfigStore;
use vanwater::adapters::tank_levels::SharedTankState;
use vanwater::app::commands::AppCommand;
use vanwater::app::events::AppEvent;
use vanwater::app::ports::{Clock, ConfigPort, PeerCommand};
use vanwater::app::service::CaseOrchestrator;
use vanwater::buttons::{ButtonEvent, ButtonId, ClickType};
use vanwater::case::{SystemCase, TankState};
use vanwater::config::SystemConfig;
use vanwater::devices::{Pump, Valve};
use vanwater::error::{Category, Error, TimeoutKind};

use super::mock_hw::{DeviceCall, MockClock, MockDevices, MockPeer, RecordingSink};

struct Bench {
    clock: MockClock,
    app: CaseOrchestrator<MockClock>,
    hw: MockDevices,
    tank: SharedTankState,
    peer: MockPeer,
    sink: RecordingSink,
}

impl Bench {
    fn new() -> Self {
        Self::with_peer(MockPeer::new())
    }

    fn with_peer(peer: MockPeer) -> Self {
        Self::with_config(SystemConfig::default(), peer)
    }

    fn with_config(config: SystemConfig, peer: MockPeer) -> Self {
        let clock = MockClock::new();
        let mut bench = Self {
            app: CaseOrchestrator::new(config, clock.clone()),
            hw: MockDevices::new(clock.clone()),
            clock,
            tank: SharedTankState::new(),
            peer,
            sink: RecordingSink::new(),
        };
        bench.app.start(&mut bench.hw, &mut bench.peer, &mut bench.sink);
        bench.hw.clear();
        bench
    }

    fn click(&mut self, button: ButtonId, click: ClickType) -> vanwater::error::Result<()> {
        self.app.handle_click(
            ButtonEvent::new(button, click),
            &mut self.hw,
            &self.tank,
            &mut self.peer,
            &mut self.sink,
        )
    }

    fn request(&mut self, target: SystemCase) -> vanwater::error::Result<()> {
        self.app
            .request_case(target, &mut self.hw, &self.tank, &mut self.peer, &mut self.sink)
    }

    fn tick(&mut self) {
        let _ = self
            .app
            .watchdog_tick(&mut self.hw, &self.tank, &mut self.peer, &mut self.sink);
    }
}

// ── Scenario A: RST + BE1 short → E1 ──────────────────────────

#[test]
fn sink_primary_from_reset_enters_e1() {
    let mut b = Bench::new();

    b.click(ButtonId::Be1, ClickType::Short).unwrap();

    assert_eq!(b.app.current_case(), SystemCase::E1);
    for valve in [Valve::A, Valve::B, Valve::C] {
        assert!(b.hw.valve_on(valve), "{:?} should be open", valve);
    }
    for valve in [Valve::D, Valve::E, Valve::F] {
        assert!(!b.hw.valve_on(valve), "{:?} should be closed", valve);
    }
    assert!(b.hw.pump_on(Pump::Pe));
    for pump in [Pump::Pd, Pump::Pv, Pump::Pp] {
        assert!(!b.hw.pump_on(pump));
    }
    assert_eq!(b.peer.case, Some(SystemCase::E1));
    assert!(b.sink.events.contains(&AppEvent::CaseChanged {
        from: SystemCase::Rst,
        to: SystemCase::E1,
    }));
}

#[test]
fn apply_sequence_order() {
    let mut b = Bench::new();
    b.request(SystemCase::D1).unwrap();

    let profile = SystemCase::D1.profile();
    let mut expected = vec![DeviceCall::TransitionLeds];
    expected.extend(Pump::ALL.map(|p| DeviceCall::Pump(p, false)));
    expected.extend(Valve::ALL.map(|v| DeviceCall::Valve(v, profile.valve(v))));
    expected.extend(Pump::ALL.map(|p| DeviceCall::Pump(p, profile.pump(p))));
    expected.push(DeviceCall::CaseLeds(SystemCase::D1));
    assert_eq!(b.hw.calls, expected);
}

#[test]
fn settle_wait_polls_until_valves_stop() {
    let mut b = Bench::new();
    let start = b.clock.now_ms();
    b.request(SystemCase::E1).unwrap();
    // 300 ms travel, polled every 100 ms
    assert!(b.clock.now_ms() - start >= 300);
    assert!(b.hw.turning_polls > 1);
}

// ── Scenario B: guard rejects without touching outputs ────────

#[test]
fn recycled_full_blocks_e2() {
    let mut b = Bench::new();
    b.click(ButtonId::Be1, ClickType::Short).unwrap();
    b.tank.set(TankState::RECYCLED_FULL);
    b.hw.clear();
    b.sink.events.clear();

    let result = b.click(ButtonId::Be2, ClickType::Short);

    assert_eq!(
        result,
        Err(Error::IncompatibleCase {
            target: SystemCase::E2,
            tank: TankState::RECYCLED_FULL,
        })
    );
    assert_eq!(b.app.current_case(), SystemCase::E1);
    assert!(b.hw.calls.is_empty(), "guard must not touch any output");
    assert!(b.sink.events.contains(&AppEvent::CaseRejected {
        target: SystemCase::E2,
        tank: TankState::RECYCLED_FULL,
    }));
    assert_eq!(b.app.errors().stats().total, 1);
    assert_eq!(b.peer.health.map(|h| h.last_code), Some(0x4002));
}

// ── Settle timeout ────────────────────────────────────────────

#[test]
fn stuck_valve_never_starts_a_pump() {
    let mut b = Bench::new();
    b.hw.valve_travel_ms = None;
    let start = b.clock.now_ms();

    let result = b.request(SystemCase::E1);

    assert_eq!(result, Err(Error::Timeout(TimeoutKind::ValveSettle)));
    assert!(b.clock.now_ms() - start > 20_000);
    assert!(!b.hw.pump_ever_on(), "no pump may run after a settle timeout");
    assert_eq!(b.app.current_case(), SystemCase::Rst);
    assert_eq!(b.hw.calls.last(), Some(&DeviceCall::CaseLeds(SystemCase::Rst)));
    assert!(b.sink.events.contains(&AppEvent::SettleTimeout {
        target: SystemCase::E1
    }));
}

// ── Idempotence ───────────────────────────────────────────────

#[test]
fn requesting_current_case_is_silent() {
    let mut b = Bench::new();
    b.request(SystemCase::V2).unwrap();
    b.hw.clear();
    let events = b.sink.events.len();

    b.request(SystemCase::V2).unwrap();

    assert!(b.hw.calls.is_empty());
    assert_eq!(b.sink.events.len(), events);
}

// ── Reset reachability ────────────────────────────────────────

#[test]
fn reset_button_works_under_any_tank_state() {
    for case in SystemCase::ALL.into_iter().filter(|c| *c != SystemCase::Rst) {
        for bits in 0..32u8 {
            let mut b = Bench::new();
            b.request(case).unwrap();
            b.tank.set(TankState::from_bits_truncate(bits));

            b.click(ButtonId::Brst, ClickType::Short).unwrap();

            assert_eq!(b.app.current_case(), SystemCase::Rst, "from {} tank {}", case, bits);
            assert!(b.hw.valves.iter().all(|v| !v));
            assert!(b.hw.pumps.iter().all(|p| !p));
        }
    }
}

// ── Auto-reset watchdog ───────────────────────────────────────

#[test]
fn idle_recirculation_resets_exactly_once() {
    let mut b = Bench::new();
    b.click(ButtonId::Bd1, ClickType::Short).unwrap();
    assert_eq!(b.app.current_case(), SystemCase::D1);
    b.hw.pe_flowing = false;

    for _ in 0..(11 * 60) {
        b.clock.advance(1000);
        b.tick();
    }

    assert_eq!(b.app.current_case(), SystemCase::Rst);
    assert_eq!(
        b.sink.count(|e| matches!(e, AppEvent::AutoReset { .. })),
        1
    );
}

#[test]
fn running_pump_keeps_the_case() {
    let mut b = Bench::new();
    b.click(ButtonId::Be1, ClickType::Short).unwrap();

    for _ in 0..(11 * 60) {
        b.clock.advance(1000);
        b.tick();
    }

    assert_eq!(b.app.current_case(), SystemCase::E1);
    assert_eq!(b.sink.count(|e| matches!(e, AppEvent::AutoReset { .. })), 0);
}

#[test]
fn watchdog_ignores_cases_without_recirculation() {
    let mut b = Bench::new();
    b.request(SystemCase::V1).unwrap();
    b.hw.pe_flowing = false;

    for _ in 0..(11 * 60) {
        b.clock.advance(1000);
        b.tick();
    }

    assert_eq!(b.app.current_case(), SystemCase::V1);
}

// ── Hood ──────────────────────────────────────────────────────

#[test]
fn hood_toggles_after_ack() {
    let mut b = Bench::new();

    b.click(ButtonId::Bh, ClickType::Short).unwrap();

    assert_eq!(b.peer.sent, vec![PeerCommand::SetHood(true)]);
    assert!(b.app.hood_on());
    assert_eq!(b.peer.hood, Some(true));
    assert!(b.hw.calls.contains(&DeviceCall::HoodLed(true)));
    assert!(b.hw.output_calls().is_empty());
}

#[test]
fn unacknowledged_hood_keeps_state() {
    let mut b = Bench::with_peer(MockPeer::silent());

    let result = b.click(ButtonId::Bh, ClickType::Short);

    assert_eq!(result, Err(Error::CommunicationFailure));
    assert!(!b.app.hood_on());
    assert!(b.hw.calls.is_empty());
    assert_eq!(b.peer.health.map(|h| h.last_code), Some(0x2001));
}

/// Each timed-out attempt is recorded before the final failure.
#[test]
fn hood_ack_timeouts_are_recorded_per_attempt() {
    let mut b = Bench::with_peer(MockPeer::silent());

    let _ = b.click(ButtonId::Bh, ClickType::Short);

    let stats = b.app.errors().stats();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.count_category(Category::Communication), 4);
    let codes: Vec<u16> = b.peer.recent.iter().flatten().map(|r| r.code).collect();
    assert_eq!(codes, [0x2004, 0x2004, 0x2004, 0x2001]);
    assert_eq!(
        b.sink.count(|e| matches!(e, AppEvent::Fault(r) if r.code == 0x2004)),
        3
    );
}

#[test]
fn peer_hood_command_updates_led() {
    let mut b = Bench::new();
    b.app
        .handle_command(AppCommand::SetAux(true), &mut b.hw, &b.tank, &mut b.peer, &mut b.sink)
        .unwrap();
    assert!(b.app.hood_on());
    assert!(b.peer.sent.is_empty(), "peer-originated state needs no round trip");
    assert_eq!(b.hw.calls, vec![DeviceCall::HoodLed(true)]);
}

// ── Config ────────────────────────────────────────────────────

/// The orchestrator runs on whatever the store held at boot.
#[test]
fn stored_config_sets_the_inactivity_window() {
    let store = NvsConfigStore::new().unwrap();
    store
        .save(&SystemConfig {
            auto_reset_inactivity_ms: 120_000,
            ..SystemConfig::default()
        })
        .unwrap();
    let mut b = Bench::with_config(store.load().unwrap(), MockPeer::new());
    b.click(ButtonId::Bd1, ClickType::Short).unwrap();
    b.hw.pe_flowing = false;

    for _ in 0..119 {
        b.clock.advance(1000);
        b.tick();
    }
    assert_eq!(b.app.current_case(), SystemCase::D1);

    for _ in 0..2 {
        b.clock.advance(1000);
        b.tick();
    }
    assert_eq!(b.app.current_case(), SystemCase::Rst);
}

#[test]
fn telemetry_reflects_outputs() {
    let mut b = Bench::new();
    b.tank.set(TankState::DIRTY_EMPTY);
    b.request(SystemCase::P1).unwrap();

    let t = b.app.build_telemetry(&b.hw, &b.tank);
    assert_eq!(t.case, SystemCase::P1);
    assert_eq!(t.tank, TankState::DIRTY_EMPTY);
    assert!(t.actuators.pumps_on[Pump::Pp.index()]);
    assert!(t.actuators.valves_open[Valve::E.index()]);
}
