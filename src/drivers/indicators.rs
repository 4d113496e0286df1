//! Button LED adapter.
//!
//! Drives the eight bicolour case LEDs and the hood LED through the output
//! chain. Each pattern is written as one batch so a half-updated set never
//! reaches the panel.

use crate::app::ports::IndicatorPort;
use crate::case::{IndicatorPattern, SystemCase};
use crate::devices::{Device, Indicator};
use crate::error::Result;

use super::executor::OutputWriter;

pub struct ButtonLeds<O> {
    out: O,
}

impl<O: OutputWriter> ButtonLeds<O> {
    pub fn new(out: O) -> Self {
        Self { out }
    }

    fn show(&self, pattern: IndicatorPattern) -> Result<()> {
        let batch = pattern
            .outputs()
            .map(|(led, on)| (Device::Indicator(led), on));
        self.out.apply(&batch)
    }
}

impl<O: OutputWriter> IndicatorPort for ButtonLeds<O> {
    fn set_case_indicators(&mut self, case: SystemCase) -> Result<()> {
        log::debug!("leds: pattern for {}", case);
        self.show(case.indicator_pattern())
    }

    fn set_transitioning_indicators(&mut self) -> Result<()> {
        self.show(IndicatorPattern::TRANSITIONING)
    }

    fn set_aux_indicator(&mut self, on: bool) -> Result<()> {
        self.out
            .set_output_state(Device::Indicator(Indicator::Hood), on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Batches(RefCell<Vec<Vec<(Device, bool)>>>);

    impl OutputWriter for Batches {
        fn set_output_state(&self, device: Device, on: bool) -> Result<()> {
            self.0.borrow_mut().push(vec![(device, on)]);
            Ok(())
        }

        fn apply(&self, changes: &[(Device, bool)]) -> Result<()> {
            self.0.borrow_mut().push(changes.to_vec());
            Ok(())
        }
    }

    fn lit(batch: &[(Device, bool)]) -> Vec<Indicator> {
        batch
            .iter()
            .filter(|(_, on)| *on)
            .filter_map(|(d, _)| match d {
                Device::Indicator(i) => Some(*i),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn case_pattern_is_one_batch() {
        let mut leds = ButtonLeds::new(Batches::default());
        leds.set_case_indicators(SystemCase::E1).unwrap();
        let batches = leds.out.0.borrow();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 8);
        assert_eq!(lit(&batches[0]), [Indicator::Be1Green, Indicator::Be2Red]);
    }

    #[test]
    fn transitioning_lights_every_button_led() {
        let mut leds = ButtonLeds::new(Batches::default());
        leds.set_transitioning_indicators().unwrap();
        assert_eq!(lit(&leds.out.0.borrow()[0]), Indicator::BUTTON_LEDS);
    }

    #[test]
    fn hood_led_is_separate() {
        let mut leds = ButtonLeds::new(Batches::default());
        leds.set_aux_indicator(true).unwrap();
        assert_eq!(
            leds.out.0.borrow()[0],
            [(Device::Indicator(Indicator::Hood), true)]
        );
    }
}
