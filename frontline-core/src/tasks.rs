//! Deferred tasks queued by card effects
//!
//! Barrage and Air Power resolve one attack per target after the selection is
//! confirmed, then end the turn. Each attack may stop for a retreat choice, so
//! the work sits in a FIFO queue owned by [`GameState`] and is drained between
//! moves.

use crate::board::HexCoord;
use crate::error::Result;
use crate::events::Event;
use crate::game::GameState;
use crate::phase::Phase;
use serde::{Deserialize, Serialize};

/// One card attack against a single hex
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatTask {
    pub target: HexCoord,
    pub dice: u8,
    pub stars_hit: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeferredTask {
    Combat(CombatTask),
    EndTurn,
}

/// Outcome of running a task
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    Complete,
    /// Waiting on a player move; draining resumes once it is made
    Paused,
}

impl DeferredTask {
    pub fn execute(&self, state: &mut GameState) -> Result<(TaskStatus, Vec<Event>)> {
        match self {
            DeferredTask::Combat(task) => {
                // The target may have been eliminated or moved off by an earlier strike
                if state.unit_at(task.target).is_none() {
                    return Ok((TaskStatus::Complete, Vec::new()));
                }
                let events = state.push_phase(Phase::AutoCombat(*task))?;
                let status = if state.has_paused_combat() {
                    TaskStatus::Paused
                } else {
                    TaskStatus::Complete
                };
                Ok((status, events))
            }
            DeferredTask::EndTurn => Ok((TaskStatus::Complete, state.end_turn())),
        }
    }
}
