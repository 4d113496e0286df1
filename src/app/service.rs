//! Case orchestrator: the hexagonal core.
//!
//! [`CaseOrchestrator`] owns the current case, the hood state, the
//! inactivity watchdog and the error log. All I/O flows through port
//! traits injected at call sites, making the whole sequence testable with
//! mock adapters.
//!
//! ```text
//!  TankLevelPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                    │     CaseOrchestrator      │
//!    DevicePort ◀──  │ guard · apply · watchdog  │ ──▶ PeerLink
//! IndicatorPort ◀──  └──────────────────────────┘
//! ```
//!
//! ## Apply sequence
//!
//! 1. Compatibility guard (reject without touching anything).
//! 2. Transitioning indicators.
//! 3. All pumps off.
//! 4. Valve pattern of the target case.
//! 5. Settle wait: every valve polled until none is turning, bounded.
//! 6. Pump pattern of the target case (skipped on settle timeout).
//! 7. Steady indicators, commit.
//!
//! The sequence blocks the orchestrator task; clicks arriving meanwhile
//! wait in the command channel.

use log::{error, info, warn};

use crate::case::{CaseAction, SystemCase, TankState, resolve};
use crate::config::SystemConfig;
use crate::devices::{Device, Pump, Valve};
use crate::diagnostics::ErrorLog;
use crate::error::{Error, Result, Severity, TimeoutKind};
use crate::buttons::ButtonEvent;

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{
    Clock, DevicePort, EventSink, IndicatorPort, PeerCommand, PeerLink,
    TankLevelPort,
};

// ───────────────────────────────────────────────────────────────
// CaseOrchestrator
// ───────────────────────────────────────────────────────────────

pub struct CaseOrchestrator<K> {
    clock: K,
    config: SystemConfig,
    current: SystemCase,
    hood_on: bool,
    /// Last time the recirculation pump was seen running (or the
    /// watchdog was re-armed).
    idle_since_ms: u64,
    started_ms: u64,
    errors: ErrorLog,
}

impl<K: Clock> CaseOrchestrator<K> {
    /// Construct in RST. Call [`start`](Self::start) once the output chain
    /// is in its safe state.
    pub fn new(config: SystemConfig, clock: K) -> Self {
        let now = clock.now_ms();
        Self {
            clock,
            config,
            current: SystemCase::Rst,
            hood_on: false,
            idle_since_ms: now,
            started_ms: now,
            errors: ErrorLog::new(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(
        &mut self,
        hw: &mut impl IndicatorPort,
        peer: &mut impl PeerLink,
        sink: &mut impl EventSink,
    ) {
        if let Err(e) = hw.set_case_indicators(self.current) {
            self.report(e, peer, sink);
        }
        if let Err(e) = hw.set_aux_indicator(self.hood_on) {
            self.report(e, peer, sink);
        }
        peer.publish_case(self.current);
        peer.publish_aux_state(self.hood_on);
        self.idle_since_ms = self.clock.now_ms();
        sink.emit(&AppEvent::Started(self.current));
        info!("orchestrator: started in {}", self.current);
    }

    // ── Input handling ────────────────────────────────────────

    /// Route one classified click through the transition rule.
    pub fn handle_click(
        &mut self,
        event: ButtonEvent,
        hw: &mut (impl DevicePort + IndicatorPort),
        tank: &impl TankLevelPort,
        peer: &mut impl PeerLink,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        match resolve(self.current, event.button, event.click) {
            CaseAction::Apply(target) => {
                info!(
                    "orchestrator: {} {:?} requests {} -> {}",
                    event.button, event.click, self.current, target
                );
                self.request_case(target, hw, tank, peer, sink)
            }
            CaseAction::ToggleAux => self.toggle_aux(hw, peer, sink),
            CaseAction::None => Ok(()),
        }
    }

    /// Process an external command (button task, peer board).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut (impl DevicePort + IndicatorPort),
        tank: &impl TankLevelPort,
        peer: &mut impl PeerLink,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        match cmd {
            AppCommand::Click(event) => self.handle_click(event, hw, tank, peer, sink),
            AppCommand::SetAux(on) => self.set_aux(on, hw, peer, sink),
            AppCommand::RequestCase(target) => self.request_case(target, hw, tank, peer, sink),
        }
    }

    // ── Case changes ──────────────────────────────────────────

    /// Run the apply sequence toward `target`. Requesting the current case
    /// is a no-op that touches no output.
    pub fn request_case(
        &mut self,
        target: SystemCase,
        hw: &mut (impl DevicePort + IndicatorPort),
        tank: &impl TankLevelPort,
        peer: &mut impl PeerLink,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        if target == self.current {
            return Ok(());
        }
        let tank_state = tank.tank_state();
        match self.apply_case(target, tank_state, hw) {
            Ok(()) => {
                let from = self.current;
                self.current = target;
                self.idle_since_ms = self.clock.now_ms();
                peer.publish_case(target);
                sink.emit(&AppEvent::CaseChanged { from, to: target });
                info!("orchestrator: case {} -> {}", from, target);
                Ok(())
            }
            Err(e) => {
                match e {
                    Error::IncompatibleCase { target, tank } => {
                        sink.emit(&AppEvent::CaseRejected { target, tank });
                    }
                    Error::Timeout(TimeoutKind::ValveSettle) => {
                        sink.emit(&AppEvent::SettleTimeout { target });
                    }
                    _ => {}
                }
                self.report(e, peer, sink);
                Err(e)
            }
        }
    }

    fn apply_case(
        &mut self,
        target: SystemCase,
        tank: TankState,
        hw: &mut (impl DevicePort + IndicatorPort),
    ) -> Result<()> {
        // 1. guard
        if !target.is_compatible(tank) {
            warn!(
                "orchestrator: {} forbidden by tank state {} (mask {})",
                target,
                tank,
                target.forbidden_mask()
            );
            return Err(Error::IncompatibleCase { target, tank });
        }

        // 2. transitioning
        if let Err(e) = hw.set_transitioning_indicators() {
            self.restore_indicators(hw);
            return Err(e);
        }

        // 3–6
        if let Err(e) = self.drive_outputs(target, hw) {
            self.restore_indicators(hw);
            return Err(e);
        }

        // 7. the routing is in place; a stale LED does not undo it
        if let Err(e) = hw.set_case_indicators(target) {
            warn!("orchestrator: indicators for {} not set: {}", target, e);
        }
        Ok(())
    }

    fn drive_outputs(&self, target: SystemCase, hw: &mut impl DevicePort) -> Result<()> {
        let profile = target.profile();

        for pump in Pump::ALL {
            hw.set_pump(pump, false)?;
        }
        for valve in Valve::ALL {
            hw.set_valve(valve, profile.valve(valve))?;
        }

        self.wait_for_valves(hw)?;

        for pump in Pump::ALL {
            hw.set_pump(pump, profile.pump(pump))?;
        }
        Ok(())
    }

    /// Poll every valve until none draws moving current. A failed read
    /// counts as still turning.
    fn wait_for_valves(&self, hw: &mut impl DevicePort) -> Result<()> {
        let start = self.clock.now_ms();
        let bound = u64::from(self.config.valve_settle_timeout_ms);
        loop {
            let turning = Valve::ALL.into_iter().any(|valve| match hw.is_turning(valve) {
                Ok(turning) => turning,
                Err(e) => {
                    warn!("orchestrator: {} sense failed: {}", Device::Valve(valve), e);
                    true
                }
            });
            if !turning {
                log::debug!(
                    "orchestrator: valves settled after {} ms",
                    self.clock.now_ms().saturating_sub(start)
                );
                return Ok(());
            }
            if self.clock.now_ms().saturating_sub(start) > bound {
                warn!("orchestrator: valves still turning after {} ms", bound);
                return Err(Error::Timeout(TimeoutKind::ValveSettle));
            }
            self.clock.sleep_ms(self.config.valve_settle_poll_ms);
        }
    }

    fn restore_indicators(&self, hw: &mut impl IndicatorPort) {
        if let Err(e) = hw.set_case_indicators(self.current) {
            warn!("orchestrator: could not restore indicators: {}", e);
        }
    }

    // ── Hood ──────────────────────────────────────────────────

    /// Ask the peer to flip the hood; local state follows only the ack.
    pub fn toggle_aux(
        &mut self,
        hw: &mut impl IndicatorPort,
        peer: &mut impl PeerLink,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let want = !self.hood_on;
        info!("orchestrator: hood {} requested", if want { "on" } else { "off" });
        let sent = peer.send_command_with_ack(PeerCommand::SetHood(want));
        for _ in 0..peer.take_ack_timeouts() {
            self.report(Error::Timeout(TimeoutKind::PeerAck), peer, sink);
        }
        if let Err(e) = sent {
            self.report(e, peer, sink);
            return Err(e);
        }
        self.set_aux(want, hw, peer, sink)
    }

    /// Adopt a hood state confirmed by (or originating from) the peer.
    pub fn set_aux(
        &mut self,
        on: bool,
        hw: &mut impl IndicatorPort,
        peer: &mut impl PeerLink,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.hood_on = on;
        peer.publish_aux_state(on);
        sink.emit(&AppEvent::AuxChanged(on));
        if let Err(e) = hw.set_aux_indicator(on) {
            self.report(e, peer, sink);
            return Err(e);
        }
        Ok(())
    }

    // ── Watchdog ──────────────────────────────────────────────

    /// Inactivity watchdog. Call at the orchestrator period.
    ///
    /// In a sink or shower case, a recirculation pump that has not been
    /// seen running for longer than the inactivity window forces RST once;
    /// the window then restarts.
    pub fn watchdog_tick(
        &mut self,
        hw: &mut (impl DevicePort + IndicatorPort),
        tank: &impl TankLevelPort,
        peer: &mut impl PeerLink,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let now = self.clock.now_ms();
        if !self.current.uses_recirculation() {
            self.idle_since_ms = now;
            return Ok(());
        }

        let pumping = match hw.is_pumping(Pump::Pe) {
            Ok(pumping) => pumping,
            Err(e) => {
                warn!("orchestrator: PE sense failed: {}", e);
                false
            }
        };
        if pumping {
            self.idle_since_ms = now;
            return Ok(());
        }

        let idle_ms = now.saturating_sub(self.idle_since_ms);
        if idle_ms <= self.config.auto_reset_inactivity_ms {
            return Ok(());
        }

        warn!(
            "orchestrator: PE idle for {} s in {}, forcing RST",
            idle_ms / 1000,
            self.current
        );
        self.idle_since_ms = now;
        sink.emit(&AppEvent::AutoReset {
            from: self.current,
            idle_ms,
        });
        self.request_case(SystemCase::Rst, hw, tank, peer, sink)
    }

    // ── Errors ────────────────────────────────────────────────

    /// Record, log, emit, and forward the updated statistics.
    fn report(&mut self, e: Error, peer: &mut impl PeerLink, sink: &mut impl EventSink) {
        let report = self.errors.record(&e, self.clock.now_ms());
        match report.severity {
            Severity::Critical | Severity::Error => {
                error!("orchestrator: [0x{:04X}] {}", report.code, e)
            }
            Severity::Warning => warn!("orchestrator: [0x{:04X}] {}", report.code, e),
            Severity::Info => info!("orchestrator: [0x{:04X}] {}", report.code, e),
        }
        sink.emit(&AppEvent::Fault(report));
        peer.publish_health(&self.errors);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(
        &self,
        hw: &impl DevicePort,
        tank: &impl TankLevelPort,
    ) -> TelemetryData {
        TelemetryData {
            case: self.current,
            hood_on: self.hood_on,
            tank: tank.tank_state(),
            actuators: hw.snapshot(),
            error_total: self.errors.stats().total,
            uptime_ms: self.clock.now_ms().saturating_sub(self.started_ms),
        }
    }

    pub fn current_case(&self) -> SystemCase {
        self.current
    }

    pub fn hood_on(&self) -> bool {
        self.hood_on
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }
}
