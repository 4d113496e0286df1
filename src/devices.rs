//! Logical outputs of the board and their place in the output chain.
//!
//! Single source of truth for the device → (register, bit) map and for
//! which devices have a current-sense channel.
//!
//! ```text
//!  reg 0:  b7 PV  b6 PE  b5 EV-F b4 EV-E b3 EV-D b2 EV-C b1 EV-B b0 EV-A
//!  reg 1:  b7 BD1g b6 BE2r b5 BE2g b4 BE1r b3 BE1g b2 BH  b1 PP  b0 PD
//!  reg 2:  b2 BD2r b1 BD2g b0 BD1r
//!  reg 3:  spare
//! ```

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of chained 8-bit shift registers.
pub const REGISTER_COUNT: usize = 4;

/// Position of one output inside the chain image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputBit {
    pub register: u8,
    pub bit: u8,
}

impl OutputBit {
    const fn new(register: u8, bit: u8) -> Self {
        Self { register, bit }
    }

    pub const fn mask(self) -> u8 {
        1 << self.bit
    }
}

// ── Electrovalves ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Valve {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Valve {
    pub const ALL: [Self; 6] = [Self::A, Self::B, Self::C, Self::D, Self::E, Self::F];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Every valve has a sense channel equal to its index.
    pub const fn sense_channel(self) -> u8 {
        self as u8
    }
}

// ── Pumps ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pump {
    /// Recirculation pump shared by the sink and shower cases.
    Pe,
    /// Shower pump.
    Pd,
    /// Drain pump.
    Pv,
    /// Rainwater pump.
    Pp,
}

impl Pump {
    pub const ALL: [Self; 4] = [Self::Pe, Self::Pd, Self::Pv, Self::Pp];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn sense_channel(self) -> Option<u8> {
        match self {
            Self::Pe => Some(6),
            Self::Pv => Some(7),
            Self::Pd | Self::Pp => None,
        }
    }
}

// ── Indicator LEDs ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Indicator {
    Hood,
    Be1Red,
    Be1Green,
    Be2Red,
    Be2Green,
    Bd1Red,
    Bd1Green,
    Bd2Red,
    Bd2Green,
}

impl Indicator {
    /// The eight red/green LEDs of the sink and shower buttons.
    pub const BUTTON_LEDS: [Self; 8] = [
        Self::Be1Red,
        Self::Be1Green,
        Self::Be2Red,
        Self::Be2Green,
        Self::Bd1Red,
        Self::Bd1Green,
        Self::Bd2Red,
        Self::Bd2Green,
    ];
}

// ── Device ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Device {
    Valve(Valve),
    Pump(Pump),
    Indicator(Indicator),
}

impl Device {
    pub const fn output_bit(self) -> OutputBit {
        match self {
            Self::Valve(v) => OutputBit::new(0, v as u8),
            Self::Pump(Pump::Pe) => OutputBit::new(0, 6),
            Self::Pump(Pump::Pv) => OutputBit::new(0, 7),
            Self::Pump(Pump::Pd) => OutputBit::new(1, 0),
            Self::Pump(Pump::Pp) => OutputBit::new(1, 1),
            Self::Indicator(Indicator::Hood) => OutputBit::new(1, 2),
            Self::Indicator(Indicator::Be1Green) => OutputBit::new(1, 3),
            Self::Indicator(Indicator::Be1Red) => OutputBit::new(1, 4),
            Self::Indicator(Indicator::Be2Green) => OutputBit::new(1, 5),
            Self::Indicator(Indicator::Be2Red) => OutputBit::new(1, 6),
            Self::Indicator(Indicator::Bd1Green) => OutputBit::new(1, 7),
            Self::Indicator(Indicator::Bd1Red) => OutputBit::new(2, 0),
            Self::Indicator(Indicator::Bd2Green) => OutputBit::new(2, 1),
            Self::Indicator(Indicator::Bd2Red) => OutputBit::new(2, 2),
        }
    }

    /// Analog sense channel, if the device has current feedback.
    pub const fn sense_channel(self) -> Option<u8> {
        match self {
            Self::Valve(v) => Some(v.sense_channel()),
            Self::Pump(p) => p.sense_channel(),
            Self::Indicator(_) => None,
        }
    }

    /// Decode the wire identifier used by the peer: 0–5 valves, 6–9 pumps
    /// (PE, PD, PV, PP), 10–18 indicators.
    pub fn from_id(id: u8) -> Result<Self> {
        const INDICATORS: [Indicator; 9] = [
            Indicator::Hood,
            Indicator::Be1Red,
            Indicator::Be1Green,
            Indicator::Be2Red,
            Indicator::Be2Green,
            Indicator::Bd1Red,
            Indicator::Bd1Green,
            Indicator::Bd2Red,
            Indicator::Bd2Green,
        ];
        let id = id as usize;
        if let Some(v) = Valve::ALL.get(id) {
            return Ok(Self::Valve(*v));
        }
        if let Some(p) = Pump::ALL.get(id.wrapping_sub(6)) {
            return Ok(Self::Pump(*p));
        }
        INDICATORS
            .get(id.wrapping_sub(10))
            .map(|i| Self::Indicator(*i))
            .ok_or(Error::InvalidArgument("device id"))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valve(v) => write!(f, "EV_{v:?}"),
            Self::Pump(p) => write!(f, "{}", match p {
                Pump::Pe => "PE",
                Pump::Pd => "PD",
                Pump::Pv => "PV",
                Pump::Pp => "PP",
            }),
            Self::Indicator(i) => write!(f, "LED_{i:?}"),
        }
    }
}
