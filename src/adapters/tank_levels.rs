//! Tank level flags shared between the comms task and the orchestrator.
//!
//! Level acquisition lives on the peer board. Every `TankState` command
//! it sends overwrites the flags here; the orchestrator reads them through
//! [`TankLevelPort`] whenever it checks a case for compatibility.

use core::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::app::ports::TankLevelPort;
use crate::case::TankState;

/// Latest tank flags. Cloning shares the same cell.
#[derive(Debug, Clone, Default)]
pub struct SharedTankState(Arc<AtomicU8>);

impl SharedTankState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, tank: TankState) {
        self.0.store(tank.bits(), Ordering::Release);
    }

    pub fn get(&self) -> TankState {
        TankState::from_bits_truncate(self.0.load(Ordering::Acquire))
    }
}

impl TankLevelPort for SharedTankState {
    fn tank_state(&self) -> TankState {
        self.get()
    }
}
