//! Pump executor.
//!
//! PE and PV have sense channels; PD and PP do not and report their last
//! commanded state. PV carries a second, higher threshold that separates
//! a dry-running pump from one actually moving water.
//!
//! ## Dual-target design
//!
//! The executor only talks to the [`OutputWriter`] / [`CurrentReader`]
//! seams, so host tests drive it with in-memory fakes.

use crate::config::SystemConfig;
use crate::devices::{Device, Pump};
use crate::error::Result;

use super::executor::{ActuatorConfig, ActuatorState, CurrentReader, Executor, OutputWriter};

pub struct PumpExecutor {
    pump: Pump,
    inner: Executor,
    water_threshold_ma: Option<f32>,
}

impl PumpExecutor {
    pub fn new(pump: Pump, config: &SystemConfig) -> Self {
        let (name, threshold_ma, water_threshold_ma) = match pump {
            Pump::Pe => ("PE", config.pe_pumping_threshold_ma, None),
            Pump::Pv => (
                "PV",
                config.pv_pumping_threshold_ma,
                Some(config.pv_water_threshold_ma),
            ),
            Pump::Pd => ("PD", 0.0, None),
            Pump::Pp => ("PP", 0.0, None),
        };
        Self {
            pump,
            inner: Executor::new(ActuatorConfig {
                name,
                device: Device::Pump(pump),
                sense_channel: pump.sense_channel(),
                threshold_ma,
            }),
            water_threshold_ma,
        }
    }

    /// The full set, indexed by [`Pump::index`].
    pub fn bank(config: &SystemConfig) -> [Self; 4] {
        Pump::ALL.map(|p| Self::new(p, config))
    }

    pub fn set_state(&mut self, out: &impl OutputWriter, on: bool, now_ms: u64) -> Result<()> {
        self.inner.set_state(out, on, now_ms)
    }

    pub fn is_pumping(&mut self, sense: &impl CurrentReader) -> Result<bool> {
        self.inner.sense(sense)
    }

    /// PV only: current above the water threshold. Other pumps fall back
    /// to [`Self::is_pumping`].
    pub fn is_pumping_water(&mut self, sense: &impl CurrentReader) -> Result<bool> {
        match self.water_threshold_ma {
            Some(threshold) => self.inner.exceeds(sense, threshold),
            None => self.is_pumping(sense),
        }
    }

    pub fn pump(&self) -> Pump {
        self.pump
    }

    pub fn name(&self) -> &'static str {
        self.inner.config().name
    }

    pub fn state(&self) -> &ActuatorState {
        self.inner.state()
    }
}
