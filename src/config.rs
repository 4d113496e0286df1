//! System configuration parameters
//!
//! Every timing constant and current threshold of the water-routing board.
//! Loaded through [`ConfigPort`](crate::app::ports::ConfigPort); defaults
//! reproduce the calibrated bench values.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Buttons ---
    /// Button poll period (milliseconds)
    pub button_poll_interval_ms: u32,
    /// Changes closer than this to the previous accepted change are ignored
    pub button_debounce_ms: u32,
    /// Press duration at or above which a release counts as Long
    pub button_long_click_ms: u32,
    /// Max gap between Short releases counted as one multi-click
    pub multi_click_window_ms: u32,
    /// Period of the progressive hold triangle (min → max → min)
    pub progressive_cycle_ms: u32,
    /// Simulated input from the peer overrides the physical level
    pub simulated_input_enabled: bool,

    // --- Case orchestration ---
    /// Watchdog / housekeeping period (milliseconds)
    pub orchestrator_interval_ms: u32,
    /// Valve `is_turning` poll period during the settle wait
    pub valve_settle_poll_ms: u32,
    /// Upper bound of the settle wait
    pub valve_settle_timeout_ms: u32,
    /// Recirculation pump idle time that triggers the auto-reset
    pub auto_reset_inactivity_ms: u64,

    // --- Shared resources ---
    /// Bounded wait for the output chain and the current front end
    pub resource_lock_timeout_ms: u32,

    // --- Current thresholds (mA) ---
    /// Above this a valve is still moving
    pub valve_turning_threshold_ma: f32,
    /// Recirculation pump (PE) running
    pub pe_pumping_threshold_ma: f32,
    /// Drain pump (PV) running, dry or wet
    pub pv_pumping_threshold_ma: f32,
    /// Drain pump (PV) actually moving water
    pub pv_water_threshold_ma: f32,

    // --- Peer link ---
    /// Attempts per acknowledged command
    pub peer_max_retries: u8,
    /// Pause between attempts
    pub peer_retry_delay_ms: u32,
    /// Wait for one acknowledgement
    pub peer_ack_timeout_ms: u32,
    /// State broadcast period
    pub peer_state_period_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Buttons
            button_poll_interval_ms: 50, // 20 Hz
            button_debounce_ms: 50,
            button_long_click_ms: 1000,
            multi_click_window_ms: 700,
            progressive_cycle_ms: 5000,
            simulated_input_enabled: true,

            // Case orchestration
            orchestrator_interval_ms: 1000, // 1 Hz
            valve_settle_poll_ms: 100,
            valve_settle_timeout_ms: 20_000,
            auto_reset_inactivity_ms: 600_000, // 10 min

            // Shared resources
            resource_lock_timeout_ms: 100,

            // Current thresholds
            valve_turning_threshold_ma: 6.0,
            pe_pumping_threshold_ma: 100.0,
            pv_pumping_threshold_ma: 100.0,
            pv_water_threshold_ma: 500.0,

            // Peer link
            peer_max_retries: 3,
            peer_retry_delay_ms: 100,
            peer_ack_timeout_ms: 1000,
            peer_state_period_ms: 1000,
        }
    }
}

impl SystemConfig {
    /// Reject values that would break the timing or threshold relations.
    pub fn validate(&self) -> Result<()> {
        if self.button_poll_interval_ms == 0 || self.orchestrator_interval_ms == 0 {
            return Err(Error::Config("task periods must be non-zero"));
        }
        if self.button_debounce_ms >= self.button_long_click_ms {
            return Err(Error::Config("debounce must be shorter than long click"));
        }
        if self.valve_settle_poll_ms == 0
            || self.valve_settle_poll_ms > self.valve_settle_timeout_ms
        {
            return Err(Error::Config("settle poll must be within settle timeout"));
        }
        if self.resource_lock_timeout_ms == 0 {
            return Err(Error::Config("resource lock timeout must be non-zero"));
        }
        if self.peer_max_retries == 0 {
            return Err(Error::Config("peer needs at least one attempt"));
        }
        let thresholds = [
            self.valve_turning_threshold_ma,
            self.pe_pumping_threshold_ma,
            self.pv_pumping_threshold_ma,
            self.pv_water_threshold_ma,
        ];
        if thresholds.iter().any(|t| !t.is_finite() || *t <= 0.0) {
            return Err(Error::Config("current thresholds must be positive"));
        }
        if self.pv_water_threshold_ma <= self.pv_pumping_threshold_ma {
            return Err(Error::Config("PV water threshold must exceed dry threshold"));
        }
        Ok(())
    }
}
