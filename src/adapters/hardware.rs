//! Hardware adapter: bridges the actuator executors to domain port traits.
//!
//! Owns the valve and pump executors and the button LED adapter, exposing
//! them through [`DevicePort`] and [`IndicatorPort`]. The output chain and
//! the current front end arrive as shared handles; each executor call
//! takes their locks for exactly one primitive operation.

use crate::app::events::ActuatorSnapshot;
use crate::app::ports::{Clock, DevicePort, IndicatorPort};
use crate::case::SystemCase;
use crate::config::SystemConfig;
use crate::devices::{Pump, Valve};
use crate::drivers::electrovalve::Electrovalve;
use crate::drivers::executor::{CurrentReader, OutputReadback, OutputWriter};
use crate::drivers::indicators::ButtonLeds;
use crate::drivers::pump::PumpExecutor;
use crate::drivers::shift_register::OutputImage;
use crate::error::Result;

/// Concrete adapter that combines all actuators behind port traits.
pub struct HardwareAdapter<O, R, K> {
    out: O,
    sense: R,
    clock: K,
    valves: [Electrovalve; 6],
    pumps: [PumpExecutor; 4],
    leds: ButtonLeds<O>,
    pv_water: bool,
    image: OutputImage,
}

impl<O, R, K> HardwareAdapter<O, R, K>
where
    O: OutputWriter + OutputReadback + Clone,
    R: CurrentReader,
    K: Clock,
{
    pub fn new(out: O, sense: R, clock: K, config: &SystemConfig) -> Self {
        Self {
            leds: ButtonLeds::new(out.clone()),
            out,
            sense,
            clock,
            valves: Electrovalve::bank(config.valve_turning_threshold_ma),
            pumps: PumpExecutor::bank(config),
            pv_water: false,
            image: OutputImage::default(),
        }
    }

    /// PV above its water threshold.
    pub fn is_pumping_water(&mut self) -> Result<bool> {
        self.pumps[Pump::Pv.index()].is_pumping_water(&self.sense)
    }

    /// Refresh every cached reading and the output image (telemetry pass).
    pub fn sample_all(&mut self) {
        for ev in &mut self.valves {
            if let Err(e) = ev.is_turning(&self.sense) {
                log::debug!("hw: {} sample failed: {}", ev.name(), e);
            }
        }
        for pump in &mut self.pumps {
            if let Err(e) = pump.is_pumping(&self.sense) {
                log::debug!("hw: {} sample failed: {}", pump.name(), e);
            }
        }
        match self.is_pumping_water() {
            Ok(water) => self.pv_water = water,
            Err(e) => log::debug!("hw: PV water sample failed: {}", e),
        }
        match self.out.output_image() {
            Ok(image) => self.image = image,
            Err(e) => log::debug!("hw: image read failed: {}", e),
        }
    }
}

// ── DevicePort implementation ─────────────────────────────────

impl<O, R, K> DevicePort for HardwareAdapter<O, R, K>
where
    O: OutputWriter + OutputReadback + Clone,
    R: CurrentReader,
    K: Clock,
{
    fn set_valve(&mut self, valve: Valve, on: bool) -> Result<()> {
        let now = self.clock.now_ms();
        self.valves[valve.index()].set_state(&self.out, on, now)
    }

    fn is_turning(&mut self, valve: Valve) -> Result<bool> {
        self.valves[valve.index()].is_turning(&self.sense)
    }

    fn set_pump(&mut self, pump: Pump, on: bool) -> Result<()> {
        let now = self.clock.now_ms();
        self.pumps[pump.index()].set_state(&self.out, on, now)
    }

    fn is_pumping(&mut self, pump: Pump) -> Result<bool> {
        self.pumps[pump.index()].is_pumping(&self.sense)
    }

    fn snapshot(&self) -> ActuatorSnapshot {
        ActuatorSnapshot {
            valves_open: self.valves.each_ref().map(|v| v.state().is_active),
            valves_ma: self.valves.each_ref().map(|v| v.state().last_current_ma),
            pumps_on: self.pumps.each_ref().map(|p| p.state().is_active),
            pumps_ma: self.pumps.each_ref().map(|p| p.state().last_current_ma),
            pv_water: self.pv_water,
            output_image: self.image,
        }
    }
}

// ── IndicatorPort implementation ──────────────────────────────

impl<O, R, K> IndicatorPort for HardwareAdapter<O, R, K>
where
    O: OutputWriter + OutputReadback + Clone,
    R: CurrentReader,
    K: Clock,
{
    fn set_case_indicators(&mut self, case: SystemCase) -> Result<()> {
        self.leds.set_case_indicators(case)
    }

    fn set_transitioning_indicators(&mut self) -> Result<()> {
        self.leds.set_transitioning_indicators()
    }

    fn set_aux_indicator(&mut self, on: bool) -> Result<()> {
        self.leds.set_aux_indicator(on)
    }
}
