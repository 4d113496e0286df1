//! Hold and multi-click helpers layered on top of the classifier.
//!
//! Neither feeds the case logic. They are generic primitives for any
//! consumer of button input (dimmers, service menus).
//!
//! ## Progressive hold
//!
//! Once a press outlasts the long-click threshold, the value ramps
//! `MIN → MAX → MIN` over one cycle and repeats while held:
//!
//! ```text
//!   255 ┤      /\        /\
//!       │     /  \      /  \
//!    10 ┤____/    \____/    \__
//!        ^long   cycle
//! ```

use crate::config::SystemConfig;

pub const PROGRESSIVE_MIN: u8 = 10;
pub const PROGRESSIVE_MAX: u8 = 255;

#[derive(Debug, Clone, Copy)]
pub struct ProgressiveHold {
    long_click_ms: u64,
    cycle_ms: u64,
}

impl ProgressiveHold {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            long_click_ms: u64::from(config.button_long_click_ms),
            cycle_ms: u64::from(config.progressive_cycle_ms.max(2)),
        }
    }

    /// Value for a press held `held_ms`, `None` before the long threshold.
    pub fn value(&self, held_ms: u64) -> Option<u8> {
        let elapsed = held_ms.checked_sub(self.long_click_ms)?;
        let half = self.cycle_ms / 2;
        let phase = elapsed % self.cycle_ms;
        let span = u64::from(PROGRESSIVE_MAX - PROGRESSIVE_MIN);
        let rise = if phase < half { phase } else { self.cycle_ms - phase };
        let offset = (span * rise.min(half) / half) as u8;
        Some(PROGRESSIVE_MIN + offset)
    }
}

/// Groups consecutive Short releases that fall within the window.
#[derive(Debug, Clone, Copy)]
pub struct MultiClickCounter {
    window_ms: u64,
    count: u8,
    last_click_ms: u64,
}

impl MultiClickCounter {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            window_ms: u64::from(config.multi_click_window_ms),
            count: 0,
            last_click_ms: 0,
        }
    }

    /// Register a Short release. Returns the running count.
    pub fn click(&mut self, now_ms: u64) -> u8 {
        if self.count > 0 && now_ms.saturating_sub(self.last_click_ms) > self.window_ms {
            self.count = 0;
        }
        self.count = self.count.saturating_add(1);
        self.last_click_ms = now_ms;
        self.count
    }

    /// Once the window closes, yields the final count and resets.
    pub fn poll(&mut self, now_ms: u64) -> Option<u8> {
        if self.count == 0 || now_ms.saturating_sub(self.last_click_ms) <= self.window_ms {
            return None;
        }
        let count = self.count;
        self.count = 0;
        Some(count)
    }

    pub fn pending(&self) -> u8 {
        self.count
    }
}
