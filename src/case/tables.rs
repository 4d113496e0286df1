//! Static per-case tables: device pattern and indicator pattern.
//!
//! Each lookup is an exhaustive `match` on [`SystemCase`], so adding a case
//! without filling every table fails to build.

use crate::devices::{Indicator, Pump, Valve};

use super::SystemCase;

/// Commanded state of every valve and pump for one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseProfile {
    /// Indexed by [`Valve::index`]. Valve F is never driven by any case.
    pub valves: [bool; 6],
    /// Indexed by [`Pump::index`] (PE, PD, PV, PP).
    pub pumps: [bool; 4],
}

impl CaseProfile {
    const fn new(abcde: [u8; 5], pe_pd_pv_pp: [u8; 4]) -> Self {
        Self {
            valves: [
                abcde[0] != 0,
                abcde[1] != 0,
                abcde[2] != 0,
                abcde[3] != 0,
                abcde[4] != 0,
                false,
            ],
            pumps: [
                pe_pd_pv_pp[0] != 0,
                pe_pd_pv_pp[1] != 0,
                pe_pd_pv_pp[2] != 0,
                pe_pd_pv_pp[3] != 0,
            ],
        }
    }

    pub const fn valve(&self, valve: Valve) -> bool {
        self.valves[valve.index()]
    }

    pub const fn pump(&self, pump: Pump) -> bool {
        self.pumps[pump.index()]
    }
}

impl SystemCase {
    pub const fn profile(self) -> CaseProfile {
        //                        A  B  C  D  E    PE PD PV PP
        match self {
            Self::Rst => CaseProfile::new([0, 0, 0, 0, 0], [0, 0, 0, 0]),
            Self::E1 => CaseProfile::new([1, 1, 1, 0, 0], [1, 0, 0, 0]),
            Self::E2 => CaseProfile::new([1, 1, 0, 0, 0], [1, 0, 0, 0]),
            Self::E3 => CaseProfile::new([0, 1, 1, 0, 0], [1, 0, 0, 0]),
            Self::E4 => CaseProfile::new([0, 1, 0, 0, 0], [1, 0, 0, 0]),
            Self::D1 => CaseProfile::new([1, 0, 1, 1, 0], [1, 1, 0, 0]),
            Self::D2 => CaseProfile::new([1, 0, 0, 1, 0], [1, 1, 0, 0]),
            Self::D3 => CaseProfile::new([0, 0, 1, 1, 0], [1, 1, 0, 0]),
            Self::D4 => CaseProfile::new([0, 0, 0, 1, 0], [1, 1, 0, 0]),
            Self::V1 => CaseProfile::new([1, 0, 1, 0, 1], [0, 0, 1, 0]),
            Self::V2 => CaseProfile::new([1, 0, 0, 0, 1], [0, 0, 1, 0]),
            Self::P1 => CaseProfile::new([1, 0, 0, 0, 1], [0, 0, 0, 1]),
        }
    }

    /// Steady LED pattern shown while this case is current.
    ///
    /// The primary button shows the source axis (green = clean, red =
    /// recycled), the secondary the destination axis (red = dirty,
    /// green = recycled).
    pub const fn indicator_pattern(self) -> IndicatorPattern {
        use LedColor::{Green, Off, Red};
        let (be1, be2, bd1, bd2) = match self {
            Self::Rst | Self::V1 | Self::V2 | Self::P1 => (Off, Off, Off, Off),
            Self::E1 => (Green, Red, Off, Off),
            Self::E2 => (Green, Green, Off, Off),
            Self::E3 => (Red, Red, Off, Off),
            Self::E4 => (Red, Green, Off, Off),
            Self::D1 => (Off, Off, Green, Red),
            Self::D2 => (Off, Off, Green, Green),
            Self::D3 => (Off, Off, Red, Red),
            Self::D4 => (Off, Off, Red, Green),
        };
        IndicatorPattern { be1, be2, bd1, bd2 }
    }
}

// ── Indicator patterns ────────────────────────────────────────

/// Colour of one bicolour button LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedColor {
    Off,
    Red,
    Green,
    /// Red and green together.
    Yellow,
}

impl LedColor {
    const fn red(self) -> bool {
        matches!(self, Self::Red | Self::Yellow)
    }

    const fn green(self) -> bool {
        matches!(self, Self::Green | Self::Yellow)
    }
}

/// Colours of the four bicolour case buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorPattern {
    pub be1: LedColor,
    pub be2: LedColor,
    pub bd1: LedColor,
    pub bd2: LedColor,
}

impl IndicatorPattern {
    /// Shown between pumps-off and the new case's steady pattern.
    pub const TRANSITIONING: Self = Self {
        be1: LedColor::Yellow,
        be2: LedColor::Yellow,
        bd1: LedColor::Yellow,
        bd2: LedColor::Yellow,
    };

    /// Expand to `(led, on)` pairs for every button LED.
    pub const fn outputs(&self) -> [(Indicator, bool); 8] {
        [
            (Indicator::Be1Red, self.be1.red()),
            (Indicator::Be1Green, self.be1.green()),
            (Indicator::Be2Red, self.be2.red()),
            (Indicator::Be2Green, self.be2.green()),
            (Indicator::Bd1Red, self.bd1.red()),
            (Indicator::Bd1Green, self.bd1.green()),
            (Indicator::Bd2Red, self.bd2.red()),
            (Indicator::Bd2Green, self.bd2.green()),
        ]
    }
}
