//! Case-transition rule: `next = f(current, button, click)`.
//!
//! Pure function of its inputs; the orchestrator decides whether and how
//! to apply the result.

use crate::buttons::{ButtonId, ClickType};

use super::{Family, SystemCase};

/// What a click asks the orchestrator to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseAction {
    /// Run the apply sequence toward this (different) case.
    Apply(SystemCase),
    /// No case change; toggle the hood on the peer board.
    ToggleAux,
    /// Nothing to do.
    None,
}

/// Target case for `(current, button, click)`; `current` when no rule matches.
pub fn next_case(current: SystemCase, button: ButtonId, click: ClickType) -> SystemCase {
    use ButtonId as B;
    use ClickType as C;

    match (button, click) {
        (B::Brst, C::Short) | (B::Be1, C::Long) | (B::Bd1, C::Long) => SystemCase::Rst,
        (B::Bv1, C::Short) => SystemCase::V1,
        (B::Bv2, C::Short) => SystemCase::V2,
        (B::Bp1, C::Permanent) => SystemCase::P1,
        (B::Be1 | B::Be2, C::Short) => flip_within(current, Family::Sink, button == B::Be1),
        (B::Bd1 | B::Bd2, C::Short) => flip_within(current, Family::Shower, button == B::Bd1),
        _ => current,
    }
}

/// Full decision for one click, including the hood fallback and the
/// "already current" short-circuit.
pub fn resolve(current: SystemCase, button: ButtonId, click: ClickType) -> CaseAction {
    let next = next_case(current, button, click);
    if next != current {
        CaseAction::Apply(next)
    } else if button == ButtonId::Bh && click == ClickType::Short {
        CaseAction::ToggleAux
    } else {
        CaseAction::None
    }
}

/// Flip one axis inside a family, or enter its default member from outside.
///
/// Members are laid out as `source * 2 + destination`:
/// `E1 = (clean, dirty)`, `E2 = (clean, recycled)`,
/// `E3 = (recycled, dirty)`, `E4 = (recycled, recycled)`.
fn flip_within(current: SystemCase, family: Family, source_axis: bool) -> SystemCase {
    let members = match family {
        Family::Shower => [SystemCase::D1, SystemCase::D2, SystemCase::D3, SystemCase::D4],
        _ => [SystemCase::E1, SystemCase::E2, SystemCase::E3, SystemCase::E4],
    };
    let Some(pos) = members.iter().position(|c| *c == current) else {
        return members[0];
    };
    let flipped = if source_axis { pos ^ 0b10 } else { pos ^ 0b01 };
    members[flipped]
}
