//! Shared core of the electrovalve and pump executors.
//!
//! An executor couples one output of the chain with an optional current
//! sense channel. Commanding it writes the output and records the target;
//! querying it reads the current (when a channel exists), caches the value
//! for telemetry and compares it against the device threshold.

use crate::devices::Device;
use crate::error::Result;

/// Write side of the output chain.
pub trait OutputWriter {
    fn set_output_state(&self, device: Device, on: bool) -> Result<()>;

    /// Several outputs at once. Chains that latch a full image override
    /// this so the group lands in a single shift.
    fn apply(&self, changes: &[(Device, bool)]) -> Result<()> {
        for &(device, on) in changes {
            self.set_output_state(device, on)?;
        }
        Ok(())
    }
}

/// Read-back of the last latched image, for diagnostics.
pub trait OutputReadback {
    fn output_image(&self) -> Result<super::shift_register::OutputImage>;
}

/// Read side of the current-sense front end.
pub trait CurrentReader {
    fn read_channel(&self, channel: u8) -> Result<f32>;
}

impl<C, K> OutputWriter for super::shift_register::OutputDriver<C, K>
where
    C: super::shift_register::OutputChain,
    K: crate::app::ports::Clock,
{
    fn set_output_state(&self, device: Device, on: bool) -> Result<()> {
        Self::set_output_state(self, device, on)
    }

    fn apply(&self, changes: &[(Device, bool)]) -> Result<()> {
        Self::apply(self, changes)
    }
}

impl<C, K> OutputReadback for super::shift_register::OutputDriver<C, K>
where
    C: super::shift_register::OutputChain,
    K: crate::app::ports::Clock,
{
    fn output_image(&self) -> Result<super::shift_register::OutputImage> {
        self.image()
    }
}

impl<I2C, K, F> CurrentReader for super::current_sensor::CurrentSense<I2C, K, F>
where
    I2C: embedded_hal::i2c::I2c,
    K: crate::app::ports::Clock,
    F: super::current_sensor::MuxFallback,
{
    fn read_channel(&self, channel: u8) -> Result<f32> {
        Self::read_channel(self, channel)
    }
}

impl<T: OutputWriter + ?Sized> OutputWriter for std::sync::Arc<T> {
    fn set_output_state(&self, device: Device, on: bool) -> Result<()> {
        (**self).set_output_state(device, on)
    }

    fn apply(&self, changes: &[(Device, bool)]) -> Result<()> {
        (**self).apply(changes)
    }
}

impl<T: OutputReadback + ?Sized> OutputReadback for std::sync::Arc<T> {
    fn output_image(&self) -> Result<super::shift_register::OutputImage> {
        (**self).output_image()
    }
}

impl<T: CurrentReader + ?Sized> CurrentReader for std::sync::Arc<T> {
    fn read_channel(&self, channel: u8) -> Result<f32> {
        (**self).read_channel(channel)
    }
}

/// Static description of one executor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorConfig {
    pub name: &'static str,
    pub device: Device,
    pub sense_channel: Option<u8>,
    pub threshold_ma: f32,
}

/// Live state, exposed for telemetry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActuatorState {
    pub is_active: bool,
    pub target_state: bool,
    pub last_state_change_ms: u64,
    pub last_current_ma: f32,
    /// `is_turning` for valves, `is_pumping` for pumps.
    pub is_moving: bool,
}

#[derive(Debug, Clone)]
pub struct Executor {
    config: ActuatorConfig,
    state: ActuatorState,
}

impl Executor {
    pub fn new(config: ActuatorConfig) -> Self {
        Self {
            config,
            state: ActuatorState::default(),
        }
    }

    pub fn set_state(&mut self, out: &impl OutputWriter, on: bool, now_ms: u64) -> Result<()> {
        self.state.target_state = on;
        out.set_output_state(self.config.device, on)?;
        self.state.is_active = on;
        self.state.last_state_change_ms = now_ms;
        Ok(())
    }

    /// Current above `threshold_ma`, or the commanded flag without a sense channel.
    pub fn exceeds(&mut self, sense: &impl CurrentReader, threshold_ma: f32) -> Result<bool> {
        let Some(channel) = self.config.sense_channel else {
            self.state.is_moving = self.state.is_active;
            return Ok(self.state.is_active);
        };
        let ma = sense.read_channel(channel)?;
        self.state.last_current_ma = ma;
        let above = ma > threshold_ma;
        self.state.is_moving = above;
        Ok(above)
    }

    /// [`Self::exceeds`] against the configured threshold.
    pub fn sense(&mut self, sense: &impl CurrentReader) -> Result<bool> {
        self.exceeds(sense, self.config.threshold_ma)
    }

    pub fn config(&self) -> &ActuatorConfig {
        &self.config
    }

    pub fn state(&self) -> &ActuatorState {
        &self.state
    }
}
