//! Current-sense reader: one INA219 behind a TCA9548 I2C multiplexer.
//!
//! ## Hardware
//!
//! Every valve and the two monitored pumps have their own shunt, routed to
//! the single INA219 through the multiplexer. Channel classes use different
//! shunts and full-scale currents, so the chip is recalibrated on every
//! read.
//!
//! | Channel | Load          | Shunt   | Max current |
//! |---------|---------------|---------|-------------|
//! | 0–5     | electrovalves | 0.1 Ω   | 0.5 A       |
//! | 6       | pump PE       | 0.08 Ω  | 4 A         |
//! | 7       | pump PV       | 0.08 Ω  | 2 A         |
//!
//! ## Read sequence (one lock hold)
//!
//! 1. select channel (`1 << ch` to the multiplexer), settle 5 ms
//! 2. reset the INA219, wait 10 ms, write the configuration
//! 3. write the calibration for the channel class
//! 4. read the current register once, convert with the same LSB
//!
//! If the multiplexer does not answer on I2C, a [`MuxFallback`] may drive
//! its address lines directly.

use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use log::{debug, warn};

use crate::app::ports::Clock;
use crate::error::{BusError, Error, Result, TimeoutKind};
use crate::sync::TimedLock;

mod reg {
    pub const CONFIG: u8 = 0x00;
    pub const CURRENT: u8 = 0x04;
    pub const CALIBRATION: u8 = 0x05;
}

const CONFIG_RESET: u16 = 0x8000;
/// 32 V bus range, PGA ±80 mV, shunt and bus continuous.
const CONFIG_DEFAULT: u16 = 0x2000 | 0x0800 | 0x0007;

const RESET_DELAY_MS: u32 = 10;
const MUX_SETTLE_MS: u32 = 5;
const MUX_CHANNELS: u8 = 8;

/// Current LSB is rounded up to a multiple of this step (µA).
const LSB_STEP_UA: u32 = 20;

// ── Channel classes ───────────────────────────────────────────

/// Shunt and full-scale current of one channel class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShuntClass {
    pub shunt_milliohm: u32,
    pub max_current_ua: u32,
}

impl ShuntClass {
    pub const VALVE: Self = Self {
        shunt_milliohm: 100,
        max_current_ua: 500_000,
    };
    pub const PUMP_PE: Self = Self {
        shunt_milliohm: 80,
        max_current_ua: 4_000_000,
    };
    pub const PUMP_PV: Self = Self {
        shunt_milliohm: 80,
        max_current_ua: 2_000_000,
    };

    /// `None` for channels without a shunt; those read 0 mA.
    pub const fn for_channel(channel: u8) -> Option<Self> {
        match channel {
            0..=5 => Some(Self::VALVE),
            6 => Some(Self::PUMP_PE),
            7 => Some(Self::PUMP_PV),
            _ => None,
        }
    }

    /// `max / 32768` rounded up to the next 20 µA step.
    pub const fn current_lsb_ua(self) -> u32 {
        self.max_current_ua.div_ceil(32_768 * LSB_STEP_UA) * LSB_STEP_UA
    }

    /// `floor(0.04096 / (lsb × shunt))`, clamped to `1..=0xFFFE`.
    pub const fn calibration(self) -> u16 {
        // 0.04096 V·s scaled by 1e6 (µA) × 1e3 (mΩ).
        let denom = self.current_lsb_ua() as u64 * self.shunt_milliohm as u64;
        let cal = if denom == 0 { 0xFFFE } else { 40_960_000 / denom };
        if cal < 1 {
            1
        } else if cal > 0xFFFE {
            0xFFFE
        } else {
            cal as u16
        }
    }

    /// Convert a raw current register value to milliamps.
    pub fn to_milliamps(self, raw: u16) -> f32 {
        f32::from(raw as i16) * self.current_lsb_ua() as f32 / 1000.0
    }
}

// ── Multiplexer fallback ──────────────────────────────────────

/// Alternative channel selection used when the I2C select fails.
pub trait MuxFallback {
    fn select(&mut self, channel: u8) -> Result<()>;
}

/// No fallback: the I2C failure is reported.
pub struct NoFallback;

impl MuxFallback for NoFallback {
    fn select(&mut self, _channel: u8) -> Result<()> {
        Err(BusError::I2c.into())
    }
}

/// Drive the multiplexer's A0–A2 address lines from GPIO.
pub struct AddressLines<A0, A1, A2> {
    a0: A0,
    a1: A1,
    a2: A2,
}

impl<A0: OutputPin, A1: OutputPin, A2: OutputPin> AddressLines<A0, A1, A2> {
    pub fn new(a0: A0, a1: A1, a2: A2) -> Self {
        Self { a0, a1, a2 }
    }
}

fn drive<P: OutputPin>(pin: &mut P, high: bool) -> Result<()> {
    let res = if high { pin.set_high() } else { pin.set_low() };
    res.map_err(|_| Error::Bus(BusError::Gpio))
}

impl<A0: OutputPin, A1: OutputPin, A2: OutputPin> MuxFallback for AddressLines<A0, A1, A2> {
    fn select(&mut self, channel: u8) -> Result<()> {
        drive(&mut self.a0, channel & 0b001 != 0)?;
        drive(&mut self.a1, channel & 0b010 != 0)?;
        drive(&mut self.a2, channel & 0b100 != 0)
    }
}

// ── Reader ────────────────────────────────────────────────────

struct FrontEnd<I2C, F> {
    i2c: I2C,
    fallback: F,
    mux_address: u8,
    sensor_address: u8,
}

impl<I2C: I2c, F: MuxFallback> FrontEnd<I2C, F> {
    fn write_register(&mut self, reg: u8, value: u16) -> Result<()> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c
            .write(self.sensor_address, &[reg, hi, lo])
            .map_err(|_| BusError::I2c)?;
        Ok(())
    }

    fn read_register(&mut self, reg: u8) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.sensor_address, &[reg], &mut buf)
            .map_err(|_| BusError::I2c)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn select(&mut self, channel: u8, clock: &impl Clock) -> Result<()> {
        if channel >= MUX_CHANNELS {
            return Err(Error::InvalidArgument("mux channel"));
        }
        if self.i2c.write(self.mux_address, &[1 << channel]).is_err() {
            warn!("current: mux I2C select failed, using fallback");
            self.fallback.select(channel)?;
        }
        clock.sleep_ms(MUX_SETTLE_MS);
        Ok(())
    }

    fn calibrate(&mut self, class: ShuntClass, clock: &impl Clock) -> Result<()> {
        self.write_register(reg::CONFIG, CONFIG_RESET)?;
        clock.sleep_ms(RESET_DELAY_MS);
        self.write_register(reg::CONFIG, CONFIG_DEFAULT)?;
        self.write_register(reg::CALIBRATION, class.calibration())
    }
}

pub struct CurrentSense<I2C, K, F = NoFallback> {
    front_end: TimedLock<FrontEnd<I2C, F>>,
    clock: K,
    lock_timeout_ms: u32,
}

impl<I2C: I2c, K: Clock> CurrentSense<I2C, K, NoFallback> {
    pub fn new(i2c: I2C, clock: K, lock_timeout_ms: u32) -> Self {
        Self::with_fallback(i2c, NoFallback, clock, lock_timeout_ms)
    }
}

impl<I2C: I2c, K: Clock, F: MuxFallback> CurrentSense<I2C, K, F> {
    pub fn with_fallback(i2c: I2C, fallback: F, clock: K, lock_timeout_ms: u32) -> Self {
        Self {
            front_end: TimedLock::new(
                FrontEnd {
                    i2c,
                    fallback,
                    mux_address: crate::pins::TCA9548_ADDR,
                    sensor_address: crate::pins::INA219_ADDR,
                },
                TimeoutKind::CurrentSense,
            ),
            clock,
            lock_timeout_ms,
        }
    }

    /// Instantaneous current on `channel`, in milliamps.
    ///
    /// The multiplexer and chip are held for exactly this call; no channel
    /// selection is assumed to survive between calls.
    pub fn read_channel(&self, channel: u8) -> Result<f32> {
        let Some(class) = ShuntClass::for_channel(channel) else {
            return Ok(0.0);
        };

        let mut fe = self.front_end.acquire(&self.clock, self.lock_timeout_ms)?;
        fe.select(channel, &self.clock)?;
        fe.calibrate(class, &self.clock)?;
        let raw = fe.read_register(reg::CURRENT)?;
        drop(fe);

        let ma = class.to_milliamps(raw);
        debug!("current: ch{} = {:.1} mA", channel, ma);
        Ok(ma)
    }
}
