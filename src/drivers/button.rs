//! Polled button classifier with short, long and latching click detection.
//!
//! ## Input sources
//!
//! Every button level is resolved from an ordered list of [`InputSource`]s;
//! the first source that returns `Some` wins, and a button no source speaks
//! for reads as released.
//!
//! ```text
//!   SimulatedInputs ──▶ PhysicalButtons ──▶ VirtualButtons ──▶ released
//!   (peer override)     (GPIO, active low)  (peer flags)
//! ```
//!
//! ## Classification
//!
//! | Press duration `d` (on release)  | Event        |
//! |----------------------------------|--------------|
//! | `d <= debounce`                  | none         |
//! | `debounce < d < long`            | `Short`      |
//! | `d >= long`                      | `Long`       |
//! | latching button, press edge      | `Permanent`  |
//!
//! Level changes within `debounce` of the previous accepted change are
//! ignored. Nothing is emitted while a button stays held; consumers that
//! need hold feedback read [`ButtonClassifier::held_for`].

use core::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use embedded_hal::digital::InputPin;

use crate::buttons::{ButtonEvent, ButtonId, ClickType};
use crate::config::SystemConfig;

/// One provider of button levels. `None` means "no opinion".
pub trait InputSource {
    fn level(&mut self, button: ButtonId) -> Option<bool>;
}

// ── Shared flags ──────────────────────────────────────────────

/// Lock-free per-button flag set, shared between the peer task (writer)
/// and the button task (reader).
#[derive(Debug, Clone, Default)]
pub struct ButtonFlags(Arc<AtomicU16>);

impl ButtonFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, button: ButtonId, pressed: bool) {
        let mask = 1u16 << button.index();
        if pressed {
            self.0.fetch_or(mask, Ordering::AcqRel);
        } else {
            self.0.fetch_and(!mask, Ordering::AcqRel);
        }
    }

    pub fn is_set(&self, button: ButtonId) -> bool {
        self.0.load(Ordering::Acquire) & (1 << button.index()) != 0
    }

    pub fn clear_all(&self) {
        self.0.store(0, Ordering::Release);
    }
}

/// Remote press override. Asserts a press while set and otherwise defers
/// to the next source, so it can never hold a wired button released.
#[derive(Debug, Clone)]
pub struct SimulatedInputs(pub ButtonFlags);

impl InputSource for SimulatedInputs {
    fn level(&mut self, button: ButtonId) -> Option<bool> {
        self.0.is_set(button).then_some(true)
    }
}

/// Software flags for the buttons without wiring.
#[derive(Debug, Clone)]
pub struct VirtualButtons(pub ButtonFlags);

impl InputSource for VirtualButtons {
    fn level(&mut self, button: ButtonId) -> Option<bool> {
        (!button.is_physical()).then(|| self.0.is_set(button))
    }
}

// ── GPIO ──────────────────────────────────────────────────────

/// Wired buttons, active low with board pull-ups.
pub struct PhysicalButtons<P> {
    pins: Vec<(ButtonId, P)>,
}

impl<P: InputPin> PhysicalButtons<P> {
    pub fn new() -> Self {
        Self { pins: Vec::new() }
    }

    pub fn with_pin(mut self, button: ButtonId, pin: P) -> Self {
        self.pins.push((button, pin));
        self
    }
}

impl<P: InputPin> Default for PhysicalButtons<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: InputPin> InputSource for PhysicalButtons<P> {
    fn level(&mut self, button: ButtonId) -> Option<bool> {
        let (_, pin) = self.pins.iter_mut().find(|(b, _)| *b == button)?;
        match pin.is_low() {
            Ok(pressed) => Some(pressed),
            Err(_) => {
                log::debug!("button: {} read failed", button);
                None
            }
        }
    }
}

// ── Classifier ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
struct ButtonState {
    pressed: bool,
    press_start_ms: u64,
    last_change_ms: Option<u64>,
    last_click: Option<ClickType>,
}

pub struct ButtonClassifier {
    sources: Vec<Box<dyn InputSource + Send>>,
    states: [ButtonState; ButtonId::COUNT],
    debounce_ms: u64,
    long_click_ms: u64,
}

impl ButtonClassifier {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            sources: Vec::new(),
            states: [ButtonState::default(); ButtonId::COUNT],
            debounce_ms: u64::from(config.button_debounce_ms),
            long_click_ms: u64::from(config.button_long_click_ms),
        }
    }

    /// Append a source at the lowest priority so far.
    pub fn with_source(mut self, source: impl InputSource + Send + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Standard stack: simulation (when enabled), GPIO, virtual flags.
    pub fn standard<P>(
        config: &SystemConfig,
        simulated: ButtonFlags,
        physical: PhysicalButtons<P>,
        virtual_flags: ButtonFlags,
    ) -> Self
    where
        P: InputPin + Send + 'static,
    {
        let mut classifier = Self::new(config);
        if config.simulated_input_enabled {
            classifier = classifier.with_source(SimulatedInputs(simulated));
        } else {
            log::info!("button: simulated input disabled");
        }
        classifier
            .with_source(physical)
            .with_source(VirtualButtons(virtual_flags))
    }

    fn resolve(&mut self, button: ButtonId) -> bool {
        self.sources
            .iter_mut()
            .find_map(|s| s.level(button))
            .unwrap_or(false)
    }

    /// Sample every button once. Call at the poll tick.
    pub fn poll(&mut self, now_ms: u64) -> heapless::Vec<ButtonEvent, { ButtonId::COUNT }> {
        let mut events = heapless::Vec::new();
        for button in ButtonId::ALL {
            let level = self.resolve(button);
            if let Some(click) = self.update(button, level, now_ms) {
                log::info!("button: {} {:?}", button, click);
                // one slot per button, cannot overflow
                let _ = events.push(ButtonEvent::new(button, click));
            }
        }
        events
    }

    /// Feed one sampled level through debounce and classification.
    pub fn update(&mut self, button: ButtonId, level: bool, now_ms: u64) -> Option<ClickType> {
        let debounce_ms = self.debounce_ms;
        let long_click_ms = self.long_click_ms;
        let state = &mut self.states[button.index()];

        if level == state.pressed {
            return None;
        }
        if let Some(last) = state.last_change_ms {
            if now_ms.saturating_sub(last) < debounce_ms {
                return None;
            }
        }
        state.pressed = level;
        state.last_change_ms = Some(now_ms);

        let click = if level {
            state.press_start_ms = now_ms;
            button.is_latching().then_some(ClickType::Permanent)
        } else if button.is_latching() {
            None
        } else {
            classify(
                now_ms.saturating_sub(state.press_start_ms),
                debounce_ms,
                long_click_ms,
            )
        };
        if click.is_some() {
            state.last_click = click;
        }
        click
    }

    /// How long `button` has been held, if it is down.
    pub fn held_for(&self, button: ButtonId, now_ms: u64) -> Option<u64> {
        let state = &self.states[button.index()];
        state
            .pressed
            .then(|| now_ms.saturating_sub(state.press_start_ms))
    }

    pub fn is_pressed(&self, button: ButtonId) -> bool {
        self.states[button.index()].pressed
    }

    pub fn last_click(&self, button: ButtonId) -> Option<ClickType> {
        self.states[button.index()].last_click
    }
}

/// Release classification of a press lasting `duration_ms`.
pub fn classify(duration_ms: u64, debounce_ms: u64, long_click_ms: u64) -> Option<ClickType> {
    if duration_ms <= debounce_ms {
        None
    } else if duration_ms < long_click_ms {
        Some(ClickType::Short)
    } else {
        Some(ClickType::Long)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> ButtonClassifier {
        ButtonClassifier::new(&SystemConfig::default())
    }

    #[test]
    fn no_events_without_press() {
        let mut btn = classifier();
        assert!(btn.poll(100).is_empty());
        assert!(btn.poll(150).is_empty());
    }

    #[test]
    fn release_boundaries() {
        assert_eq!(classify(50, 50, 1000), None);
        assert_eq!(classify(51, 50, 1000), Some(ClickType::Short));
        assert_eq!(classify(999, 50, 1000), Some(ClickType::Short));
        assert_eq!(classify(1000, 50, 1000), Some(ClickType::Long));
    }

    #[test]
    fn short_and_long_clicks() {
        let mut btn = classifier();
        assert_eq!(btn.update(ButtonId::Be1, true, 1000), None);
        assert_eq!(btn.update(ButtonId::Be1, false, 1200), Some(ClickType::Short));
        assert_eq!(btn.update(ButtonId::Be1, true, 2000), None);
        assert_eq!(btn.update(ButtonId::Be1, false, 3500), Some(ClickType::Long));
        assert_eq!(btn.last_click(ButtonId::Be1), Some(ClickType::Long));
    }

    #[test]
    fn debounce_filters_rapid_noise() {
        let mut btn = classifier();
        btn.update(ButtonId::Bd2, true, 1000);
        // bounce 20 ms after the press is ignored
        assert_eq!(btn.update(ButtonId::Bd2, false, 1020), None);
        assert!(btn.is_pressed(ButtonId::Bd2));
        assert_eq!(btn.update(ButtonId::Bd2, false, 1300), Some(ClickType::Short));
    }

    #[test]
    fn latching_button_fires_on_press_edge_only() {
        let mut btn = classifier();
        assert_eq!(
            btn.update(ButtonId::Bp1, true, 500),
            Some(ClickType::Permanent)
        );
        assert_eq!(btn.update(ButtonId::Bp1, false, 5000), None);
    }

    #[test]
    fn held_for_tracks_press() {
        let mut btn = classifier();
        assert_eq!(btn.held_for(ButtonId::Bh, 10), None);
        btn.update(ButtonId::Bh, true, 100);
        assert_eq!(btn.held_for(ButtonId::Bh, 1600), Some(1500));
    }

    #[test]
    fn simulated_press_overrides_and_releases_to_lower_source() {
        let sim = ButtonFlags::new();
        let virt = ButtonFlags::new();
        let mut btn = classifier()
            .with_source(SimulatedInputs(sim.clone()))
            .with_source(VirtualButtons(virt.clone()));

        sim.set(ButtonId::Be2, true);
        assert!(btn.poll(1000).is_empty());
        sim.set(ButtonId::Be2, false);
        let events = btn.poll(1100);
        assert_eq!(events.as_slice(), &[ButtonEvent::new(ButtonId::Be2, ClickType::Short)]);
    }

    #[test]
    fn virtual_flags_only_speak_for_unwired_buttons() {
        let virt = ButtonFlags::new();
        let mut src = VirtualButtons(virt.clone());
        virt.set(ButtonId::Brst, true);
        virt.set(ButtonId::Be1, true);
        assert_eq!(src.level(ButtonId::Brst), Some(true));
        assert_eq!(src.level(ButtonId::Be1), None);
        virt.clear_all();
        assert_eq!(src.level(ButtonId::Brst), Some(false));
    }

    #[test]
    fn standard_stack_skips_simulation_when_disabled() {
        struct NeverPin;
        impl embedded_hal::digital::ErrorType for NeverPin {
            type Error = core::convert::Infallible;
        }
        impl InputPin for NeverPin {
            fn is_high(&mut self) -> Result<bool, Self::Error> {
                Ok(true)
            }
            fn is_low(&mut self) -> Result<bool, Self::Error> {
                Ok(false)
            }
        }

        let config = SystemConfig {
            simulated_input_enabled: false,
            ..SystemConfig::default()
        };
        let sim = ButtonFlags::new();
        let mut btn = ButtonClassifier::standard(
            &config,
            sim.clone(),
            PhysicalButtons::new().with_pin(ButtonId::Be1, NeverPin),
            ButtonFlags::new(),
        );
        sim.set(ButtonId::Be1, true);
        btn.poll(1000);
        assert!(!btn.is_pressed(ButtonId::Be1));
    }
}
