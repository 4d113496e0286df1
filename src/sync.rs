//! Bounded-wait ownership of shared hardware resources.
//!
//! The output chain and the current-sense front end are each wrapped in a
//! [`TimedLock`]. A caller either obtains the guard within the configured
//! bound or gets `Error::Timeout`; the guard releases the resource on drop,
//! including every early-return path.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};

use crate::app::ports::Clock;
use crate::error::{Error, Result, TimeoutKind};

/// Poll step while waiting for a contended lock.
const RETRY_STEP_MS: u32 = 1;

pub type LockGuard<'a, T> = MutexGuard<'a, CriticalSectionRawMutex, T>;

pub struct TimedLock<T> {
    inner: Mutex<CriticalSectionRawMutex, T>,
    kind: TimeoutKind,
}

impl<T> TimedLock<T> {
    pub const fn new(value: T, kind: TimeoutKind) -> Self {
        Self {
            inner: Mutex::new(value),
            kind,
        }
    }

    /// Wait up to `timeout_ms` for exclusive ownership.
    pub fn acquire(&self, clock: &impl Clock, timeout_ms: u32) -> Result<LockGuard<'_, T>> {
        let start = clock.now_ms();
        loop {
            if let Ok(guard) = self.inner.try_lock() {
                return Ok(guard);
            }
            if clock.now_ms().saturating_sub(start) >= u64::from(timeout_ms) {
                log::warn!("lock: {} not granted within {} ms", self.kind, timeout_ms);
                return Err(Error::Timeout(self.kind));
            }
            clock.sleep_ms(RETRY_STEP_MS);
        }
    }

    /// Take the lock only if it is free right now.
    pub fn try_acquire(&self) -> Option<LockGuard<'_, T>> {
        self.inner.try_lock().ok()
    }
}
