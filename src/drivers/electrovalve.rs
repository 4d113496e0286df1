//! Electrovalve executor.
//!
//! A motorised valve draws current only while it travels between open and
//! closed. Above the shared threshold the valve is still turning; below it
//! the valve has reached its end stop.

use crate::devices::{Device, Valve};
use crate::error::Result;

use super::executor::{ActuatorConfig, ActuatorState, CurrentReader, Executor, OutputWriter};

pub struct Electrovalve {
    inner: Executor,
}

impl Electrovalve {
    pub fn new(valve: Valve, threshold_ma: f32) -> Self {
        const NAMES: [&str; 6] = ["EV_A", "EV_B", "EV_C", "EV_D", "EV_E", "EV_F"];
        Self {
            inner: Executor::new(ActuatorConfig {
                name: NAMES[valve.index()],
                device: Device::Valve(valve),
                sense_channel: Some(valve.sense_channel()),
                threshold_ma,
            }),
        }
    }

    /// The full bank, indexed by [`Valve::index`].
    pub fn bank(threshold_ma: f32) -> [Self; 6] {
        Valve::ALL.map(|v| Self::new(v, threshold_ma))
    }

    pub fn set_state(&mut self, out: &impl OutputWriter, open: bool, now_ms: u64) -> Result<()> {
        self.inner.set_state(out, open, now_ms)
    }

    pub fn is_turning(&mut self, sense: &impl CurrentReader) -> Result<bool> {
        self.inner.sense(sense)
    }

    pub fn name(&self) -> &'static str {
        self.inner.config().name
    }

    pub fn state(&self) -> &ActuatorState {
        self.inner.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct Fake {
        writes: RefCell<Vec<(Device, bool)>>,
        current_ma: Cell<f32>,
    }

    impl OutputWriter for Fake {
        fn set_output_state(&self, device: Device, on: bool) -> Result<()> {
            self.writes.borrow_mut().push((device, on));
            Ok(())
        }
    }

    impl CurrentReader for Fake {
        fn read_channel(&self, _channel: u8) -> Result<f32> {
            Ok(self.current_ma.get())
        }
    }

    #[test]
    fn set_state_records_target_and_time() {
        let hw = Fake::default();
        let mut ev = Electrovalve::new(Valve::C, 6.0);
        ev.set_state(&hw, true, 1234).unwrap();
        assert_eq!(hw.writes.borrow().as_slice(), &[(Device::Valve(Valve::C), true)]);
        assert!(ev.state().is_active);
        assert!(ev.state().target_state);
        assert_eq!(ev.state().last_state_change_ms, 1234);
        assert_eq!(ev.name(), "EV_C");
    }

    #[test]
    fn turning_compares_against_threshold_and_caches_reading() {
        let hw = Fake::default();
        let mut ev = Electrovalve::new(Valve::A, 6.0);
        hw.current_ma.set(6.0);
        assert!(!ev.is_turning(&hw).unwrap(), "exactly at threshold is settled");
        hw.current_ma.set(42.5);
        assert!(ev.is_turning(&hw).unwrap());
        assert!((ev.state().last_current_ma - 42.5).abs() < f32::EPSILON);
        assert!(ev.state().is_moving);
    }
}
