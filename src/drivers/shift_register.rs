//! Device output driver over a chain of 74HC595 shift registers.
//!
//! ## Image
//!
//! The driver keeps a `[u8; REGISTER_COUNT]` image of every output. An
//! update edits the image, shifts the *whole* image out and latches it,
//! all while holding the chain's [`TimedLock`]. Readers take the same lock,
//! so nobody observes a half-applied update.
//!
//! ```text
//!   image[3] ──▶ … ──▶ image[0]      (last register shifted first, MSB first)
//!      DS ─┬─ SHCP ×32 ─┬─ STCP ▲    (latch once per update)
//! ```
//!
//! ## Failure handling
//!
//! If the chain cannot be acquired within the bound the call fails with
//! `Timeout` and the requested change is dropped. If shifting fails the
//! image keeps its previous contents, so [`OutputDriver::get_device_state`]
//! never reports an output that was not latched.

use embedded_hal::digital::OutputPin;
use log::{debug, warn};

use crate::app::ports::Clock;
use crate::devices::{Device, REGISTER_COUNT};
use crate::error::{BusError, Result, TimeoutKind};
use crate::sync::TimedLock;

pub type OutputImage = [u8; REGISTER_COUNT];

/// Serial-in / parallel-out hardware behind the driver.
pub trait OutputChain {
    /// Shift out `image` and latch it.
    fn shift_out(&mut self, image: &OutputImage) -> Result<()>;

    /// Drive the shared output-enable line.
    fn set_output_enable(&mut self, enabled: bool) -> Result<()>;
}

// ── Bit-banged 74HC595 chain ──────────────────────────────────

/// Five control lines of the chain.
pub struct ShiftRegisterPins<DS, SHCP, STCP, OE, MR> {
    ds: DS,
    shcp: SHCP,
    stcp: STCP,
    oe: OE,
    mr: MR,
}

impl<DS, SHCP, STCP, OE, MR> ShiftRegisterPins<DS, SHCP, STCP, OE, MR>
where
    DS: OutputPin,
    SHCP: OutputPin,
    STCP: OutputPin,
    OE: OutputPin,
    MR: OutputPin,
{
    /// Outputs stay disabled (OE high) until [`OutputChain::set_output_enable`].
    pub fn new(ds: DS, shcp: SHCP, stcp: STCP, oe: OE, mr: MR) -> Result<Self> {
        let mut pins = Self { ds, shcp, stcp, oe, mr };
        pins.oe.set_high().map_err(|_| BusError::Gpio)?;
        pins.shcp.set_low().map_err(|_| BusError::Gpio)?;
        pins.stcp.set_low().map_err(|_| BusError::Gpio)?;
        pins.mr.set_high().map_err(|_| BusError::Gpio)?;
        Ok(pins)
    }

    fn clock_bit(&mut self, high: bool) -> core::result::Result<(), BusError> {
        if high {
            self.ds.set_high().map_err(|_| BusError::Gpio)?;
        } else {
            self.ds.set_low().map_err(|_| BusError::Gpio)?;
        }
        self.shcp.set_high().map_err(|_| BusError::Gpio)?;
        self.shcp.set_low().map_err(|_| BusError::Gpio)
    }
}

impl<DS, SHCP, STCP, OE, MR> OutputChain for ShiftRegisterPins<DS, SHCP, STCP, OE, MR>
where
    DS: OutputPin,
    SHCP: OutputPin,
    STCP: OutputPin,
    OE: OutputPin,
    MR: OutputPin,
{
    fn shift_out(&mut self, image: &OutputImage) -> Result<()> {
        for byte in image.iter().rev() {
            for bit in (0..8).rev() {
                self.clock_bit(byte & (1 << bit) != 0)?;
            }
        }
        self.stcp.set_high().map_err(|_| BusError::Gpio)?;
        self.stcp.set_low().map_err(|_| BusError::Gpio)?;
        Ok(())
    }

    fn set_output_enable(&mut self, enabled: bool) -> Result<()> {
        // OE is active LOW.
        let res = if enabled { self.oe.set_low() } else { self.oe.set_high() };
        res.map_err(|_| BusError::Gpio)?;
        Ok(())
    }
}

// ── Output driver ─────────────────────────────────────────────

struct ChainState<C> {
    chain: C,
    image: OutputImage,
}

pub struct OutputDriver<C, K> {
    state: TimedLock<ChainState<C>>,
    clock: K,
    lock_timeout_ms: u32,
}

impl<C: OutputChain, K: Clock> OutputDriver<C, K> {
    pub fn new(chain: C, clock: K, lock_timeout_ms: u32) -> Self {
        Self {
            state: TimedLock::new(
                ChainState {
                    chain,
                    image: [0; REGISTER_COUNT],
                },
                TimeoutKind::OutputChain,
            ),
            clock,
            lock_timeout_ms,
        }
    }

    /// Set one output and latch the full image.
    pub fn set_output_state(&self, device: Device, on: bool) -> Result<()> {
        self.apply(&[(device, on)])
    }

    /// Set several outputs and latch the full image once.
    pub fn apply(&self, changes: &[(Device, bool)]) -> Result<()> {
        let mut state = self.state.acquire(&self.clock, self.lock_timeout_ms)?;
        let mut next = state.image;
        for (device, on) in changes {
            let pos = device.output_bit();
            let byte = &mut next[pos.register as usize];
            if *on {
                *byte |= pos.mask();
            } else {
                *byte &= !pos.mask();
            }
        }
        if let Err(e) = state.chain.shift_out(&next) {
            warn!("output: shift failed ({}), image unchanged", e);
            return Err(e);
        }
        state.image = next;
        debug!("output: latched {:02X?}", next);
        Ok(())
    }

    /// Last commanded value of `device` (no physical read-back).
    pub fn get_device_state(&self, device: Device) -> Result<bool> {
        let state = self.state.acquire(&self.clock, self.lock_timeout_ms)?;
        let pos = device.output_bit();
        Ok(state.image[pos.register as usize] & pos.mask() != 0)
    }

    /// Clear every output and latch.
    pub fn set_all_outputs_safe(&self) -> Result<()> {
        let mut state = self.state.acquire(&self.clock, self.lock_timeout_ms)?;
        let cleared = [0; REGISTER_COUNT];
        state.chain.shift_out(&cleared)?;
        state.image = cleared;
        Ok(())
    }

    pub fn enable_outputs(&self, enabled: bool) -> Result<()> {
        let mut state = self.state.acquire(&self.clock, self.lock_timeout_ms)?;
        state.chain.set_output_enable(enabled)
    }

    /// Copy of the current image, for diagnostics.
    pub fn image(&self) -> Result<OutputImage> {
        let state = self.state.acquire(&self.clock, self.lock_timeout_ms)?;
        Ok(state.image)
    }
}
