//! Plumbing cases and the tank-state compatibility guard.
//!
//! A [`SystemCase`] names one routing configuration of the valves and
//! pumps. Exactly one case is current at any time; [`SystemCase::Rst`] is
//! the all-off default and has an empty forbidden mask, so it is always
//! reachable.
//!
//! ```text
//!   sink     E1 ─BE2─ E2        shower   D1 ─BD2─ D2
//!            │         │                 │         │
//!           BE1       BE1               BD1       BD1
//!            │         │                 │         │
//!            E3 ─BE2─ E4                 D3 ─BD2─ D4
//!
//!   drain    V1, V2 (direct)    rainwater P1 (latching)
//! ```
//!
//! All per-case data lives in [`tables`] as exhaustive `match`es.

pub mod tables;
pub mod transition;

pub use tables::{CaseProfile, IndicatorPattern, LedColor};
pub use transition::{CaseAction, next_case, resolve};

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ───────────────────────────────────────────────────────────────
// SystemCase
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum SystemCase {
    #[default]
    Rst = 0,
    E1 = 1,
    E2 = 2,
    E3 = 3,
    E4 = 4,
    D1 = 5,
    D2 = 6,
    D3 = 7,
    D4 = 8,
    V1 = 9,
    V2 = 10,
    P1 = 11,
}

/// Case families sharing a button pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Reset,
    Sink,
    Shower,
    Drain,
    Rainwater,
}

impl SystemCase {
    pub const ALL: [Self; 12] = [
        Self::Rst,
        Self::E1,
        Self::E2,
        Self::E3,
        Self::E4,
        Self::D1,
        Self::D2,
        Self::D3,
        Self::D4,
        Self::V1,
        Self::V2,
        Self::P1,
    ];

    pub const fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Result<Self> {
        Self::ALL
            .get(id as usize)
            .copied()
            .ok_or(Error::InvalidArgument("case id"))
    }

    pub const fn family(self) -> Family {
        match self {
            Self::Rst => Family::Reset,
            Self::E1 | Self::E2 | Self::E3 | Self::E4 => Family::Sink,
            Self::D1 | Self::D2 | Self::D3 | Self::D4 => Family::Shower,
            Self::V1 | Self::V2 => Family::Drain,
            Self::P1 => Family::Rainwater,
        }
    }

    /// Sink and shower cases run the recirculation pump and are watched
    /// by the inactivity auto-reset.
    pub const fn uses_recirculation(self) -> bool {
        matches!(self.family(), Family::Sink | Family::Shower)
    }

    /// Tank flags that forbid entering this case.
    pub const fn forbidden_mask(self) -> TankState {
        use TankState as T;
        let bits = match self {
            Self::Rst => 0,
            Self::E1 | Self::D1 => T::CLEAN_EMPTY.0 | T::DIRTY_FULL.0,
            Self::E2 | Self::D2 => T::CLEAN_EMPTY.0 | T::RECYCLED_FULL.0,
            Self::E3 | Self::D3 => T::DIRTY_FULL.0 | T::RECYCLED_EMPTY.0,
            Self::E4 | Self::D4 => T::RECYCLED_FULL.0 | T::RECYCLED_EMPTY.0,
            Self::V1 => T::DIRTY_EMPTY.0,
            Self::V2 => T::RECYCLED_EMPTY.0,
            Self::P1 => T::RECYCLED_FULL.0,
        };
        TankState(bits)
    }

    /// `true` when no forbidden flag is raised in `tank`.
    pub const fn is_compatible(self, tank: TankState) -> bool {
        self.forbidden_mask().0 & tank.0 == 0
    }
}

impl fmt::Display for SystemCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rst => "RST",
            Self::E1 => "E1",
            Self::E2 => "E2",
            Self::E3 => "E3",
            Self::E4 => "E4",
            Self::D1 => "D1",
            Self::D2 => "D2",
            Self::D3 => "D3",
            Self::D4 => "D4",
            Self::V1 => "V1",
            Self::V2 => "V2",
            Self::P1 => "P1",
        };
        f.write_str(name)
    }
}

// ───────────────────────────────────────────────────────────────
// TankState
// ───────────────────────────────────────────────────────────────

/// Five empty/full flags for the clean, dirty and recycled tanks.
///
/// Produced by the level-acquisition side; read-only to the case logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TankState(u8);

impl TankState {
    pub const NONE: Self = Self(0);
    pub const CLEAN_EMPTY: Self = Self(1 << 0);
    pub const DIRTY_FULL: Self = Self(1 << 1);
    pub const DIRTY_EMPTY: Self = Self(1 << 2);
    pub const RECYCLED_FULL: Self = Self(1 << 3);
    pub const RECYCLED_EMPTY: Self = Self(1 << 4);

    const VALID: u8 = 0b1_1111;

    /// Build from raw bits, discarding anything above bit 4.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::VALID)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl core::ops::BitOr for TankState {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Display for TankState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        const NAMES: [(TankState, &str); 5] = [
            (TankState::CLEAN_EMPTY, "CE"),
            (TankState::DIRTY_FULL, "DF"),
            (TankState::DIRTY_EMPTY, "DE"),
            (TankState::RECYCLED_FULL, "RF"),
            (TankState::RECYCLED_EMPTY, "RE"),
        ];
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}
