//! Battle analysis for automated players

use crate::dice::DieFace;
use crate::error::{Result, RulesError};
use crate::game::GameState;
use crate::moves::Move;
use crate::phase::PhaseKind;

/// Expected hits of a battle move against its target.
///
/// Only meaningful while battles are on offer, so any other phase is
/// `WrongPhase`.
pub fn expected_hits(state: &GameState, mv: &Move) -> Result<f32> {
    let actual = state.phase_kind();
    if !matches!(actual, PhaseKind::Battle | PhaseKind::ArmorOverrun) {
        return Err(RulesError::WrongPhase {
            expected: PhaseKind::Battle,
            actual,
        });
    }
    let Move::Battle { to, dice, .. } = *mv else {
        return Err(RulesError::IllegalMove(format!("{mv:?} is not a battle")));
    };
    let target = state.unit_at(to).ok_or(RulesError::NoUnitAt(to))?;
    let per_die = target.kind.symbol().probability() + DieFace::Grenade.probability();
    Ok(dice as f32 * per_die)
}
