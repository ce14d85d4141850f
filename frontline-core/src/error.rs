//! Rules engine error types

use crate::board::HexCoord;
use crate::phase::PhaseKind;

/// Errors raised by the rules engine.
///
/// These are invariant violations rather than expected runtime conditions:
/// the failing operation is abandoned and the error handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    #[error("terrain map is frozen; cannot set terrain at {0}")]
    TerrainFrozen(HexCoord),

    #[error("die outcome queried before it was rolled")]
    DieNotRolled,

    #[error("scripted dice exhausted: {requested} requested, {remaining} remaining")]
    InsufficientScriptedResults { requested: usize, remaining: usize },

    #[error("unit {0} has no position on the board")]
    UnitNotOnBoard(u32),

    #[error("no unit at {0}")]
    NoUnitAt(HexCoord),

    #[error("hex {0} is already occupied")]
    HexOccupied(HexCoord),

    #[error("unit at {0} must start with at least one strength point")]
    ZeroStrength(HexCoord),

    #[error("hex {0} is off the board")]
    OffBoard(HexCoord),

    #[error("query requires a {expected:?} phase but current phase is {actual:?}")]
    WrongPhase {
        expected: PhaseKind,
        actual: PhaseKind,
    },

    #[error("phase stack is empty")]
    EmptyPhaseStack,

    #[error("move is not legal in the current phase: {0}")]
    IllegalMove(String),

    #[error("game is already over")]
    GameOver,
}

pub type Result<T> = std::result::Result<T, RulesError>;
