//! Operator buttons and the click types the classifier produces.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ButtonId {
    /// Sink primary: flips the source axis.
    Be1 = 0,
    /// Sink secondary: flips the destination axis.
    Be2 = 1,
    /// Shower primary.
    Bd1 = 2,
    /// Shower secondary.
    Bd2 = 3,
    /// Hood (auxiliary device on the peer board).
    Bh = 4,
    Bv1 = 5,
    Bv2 = 6,
    /// Rainwater; latching.
    Bp1 = 7,
    Brst = 8,
}

impl ButtonId {
    pub const COUNT: usize = 9;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Be1,
        Self::Be2,
        Self::Bd1,
        Self::Bd2,
        Self::Bh,
        Self::Bv1,
        Self::Bv2,
        Self::Bp1,
        Self::Brst,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_id(id: u8) -> Result<Self> {
        Self::ALL
            .get(id as usize)
            .copied()
            .ok_or(Error::InvalidArgument("button id"))
    }

    /// GPIO of wired buttons; the rest only exist as virtual flags.
    pub const fn gpio(self) -> Option<i32> {
        match self {
            Self::Be1 => Some(crate::pins::BUTTON_BE1_GPIO),
            Self::Be2 => Some(crate::pins::BUTTON_BE2_GPIO),
            Self::Bd1 => Some(crate::pins::BUTTON_BD1_GPIO),
            Self::Bd2 => Some(crate::pins::BUTTON_BD2_GPIO),
            Self::Bh => Some(crate::pins::BUTTON_BH_GPIO),
            Self::Bv1 | Self::Bv2 | Self::Bp1 | Self::Brst => None,
        }
    }

    pub const fn is_physical(self) -> bool {
        self.gpio().is_some()
    }

    /// Latching buttons report a sustained press instead of a release click.
    pub const fn is_latching(self) -> bool {
        matches!(self, Self::Bp1)
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Be1 => "BE1",
            Self::Be2 => "BE2",
            Self::Bd1 => "BD1",
            Self::Bd2 => "BD2",
            Self::Bh => "BH",
            Self::Bv1 => "BV1",
            Self::Bv2 => "BV2",
            Self::Bp1 => "BP1",
            Self::Brst => "BRST",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClickType {
    Short,
    Long,
    /// Sustained press on a latching button.
    Permanent,
}

/// One classified click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonEvent {
    pub button: ButtonId,
    pub click: ClickType,
}

impl ButtonEvent {
    pub const fn new(button: ButtonId, click: ClickType) -> Self {
        Self { button, click }
    }
}
