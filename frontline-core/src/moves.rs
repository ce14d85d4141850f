//! Player moves
//!
//! Every player decision is a [`Move`] value. The game only executes moves
//! it offered through `legal_moves()`, so `execute` can assume the move fits
//! the phase on top of the stack.

use crate::board::HexCoord;
use crate::cards::{AfterOrders, Card, PhaseTransition};
use crate::combat;
use crate::error::{Result, RulesError};
use crate::events::Event;
use crate::game::GameState;
use crate::phase::{Phase, PhaseKind};
use crate::tasks::{CombatTask, DeferredTask};
use crate::terrain::Fortification;
use crate::units::UnitKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A legal move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    PlayCard { card: Card },
    OrderUnit { hex: HexCoord },
    UnOrderUnit { hex: HexCoord },
    MoveUnit { from: HexCoord, to: HexCoord },
    /// `pops_phase` is set for overrun battles
    Battle {
        from: HexCoord,
        to: HexCoord,
        dice: u8,
        pops_phase: bool,
    },
    Retreat { from: HexCoord, to: HexCoord },
    TakeGround { from: HexCoord, to: HexCoord },
    DeclineTakeGround { hex: HexCoord },
    SelectTarget { hex: HexCoord },
    UnSelectTarget { hex: HexCoord },
    ConfirmTargets,
    EndPhase,
}

impl Move {
    pub fn execute(&self, state: &mut GameState) -> Result<Vec<Event>> {
        match *self {
            Move::PlayCard { card } => play_card(state, card),
            Move::OrderUnit { hex } => {
                let unit = *state.unit_at(hex).ok_or(RulesError::NoUnitAt(hex))?;
                state.unit_state_mut(unit.id)?.ordered = true;
                Ok(vec![Event::UnitOrdered { unit, at: hex }])
            }
            Move::UnOrderUnit { hex } => {
                let unit = *state.unit_at(hex).ok_or(RulesError::NoUnitAt(hex))?;
                state.unit_state_mut(unit.id)?.ordered = false;
                Ok(vec![Event::UnitUnordered { unit, at: hex }])
            }
            Move::MoveUnit { from, to } => move_unit(state, from, to),
            Move::Battle {
                from,
                to,
                dice,
                pops_phase,
            } => combat::battle(state, from, to, dice, pops_phase),
            Move::Retreat { from, to } => {
                let Phase::Retreat(choice) = state.current_phase().clone() else {
                    return Err(wrong_phase(state, PhaseKind::Retreat));
                };
                let mut events = Vec::new();
                combat::retreat_unit(state, from, to, &mut events)?;
                events.extend(state.pop_phase()?);
                if to != from {
                    let follow_up = combat::take_ground_after(state, choice.pursuit, from);
                    events.extend(combat::apply_follow_up(state, follow_up)?);
                }
                Ok(events)
            }
            Move::TakeGround { from, to } => {
                let Phase::TakeGround(offer) = state.current_phase().clone() else {
                    return Err(wrong_phase(state, PhaseKind::TakeGround));
                };
                let unit = *state.unit_at(from).ok_or(RulesError::NoUnitAt(from))?;
                state.relocate_unit(from, to)?;
                let mut events = vec![Event::GroundTaken { unit, from, to }];
                events.extend(state.pop_phase()?);
                if unit.kind == UnitKind::Armor && !offer.overrun_used {
                    events.extend(state.push_phase(Phase::ArmorOverrun { hex: to })?);
                }
                Ok(events)
            }
            Move::DeclineTakeGround { hex } => {
                let unit = *state.unit_at(hex).ok_or(RulesError::NoUnitAt(hex))?;
                let mut events = vec![Event::TakeGroundDeclined { unit }];
                events.extend(state.pop_phase()?);
                Ok(events)
            }
            Move::SelectTarget { hex } => {
                let unit = *state.unit_at(hex).ok_or(RulesError::NoUnitAt(hex))?;
                state.select_target(hex)?;
                Ok(vec![Event::TargetSelected { unit, at: hex }])
            }
            Move::UnSelectTarget { hex } => {
                let unit = *state.unit_at(hex).ok_or(RulesError::NoUnitAt(hex))?;
                state.unit_state_mut(unit.id)?.targeted = None;
                Ok(vec![Event::TargetUnselected { unit, at: hex }])
            }
            Move::ConfirmTargets => confirm_targets(state),
            Move::EndPhase => end_phase(state),
        }
    }
}

fn wrong_phase(state: &GameState, expected: PhaseKind) -> RulesError {
    RulesError::WrongPhase {
        expected,
        actual: state.phase_kind(),
    }
}

fn play_card(state: &mut GameState, card: Card) -> Result<Vec<Event>> {
    let side = state.turn_side();
    state.take_from_hand(side, card)?;
    state.set_current_card(Some(card));
    tracing::info!("{} play {}", side, card);

    let mut events = vec![Event::CardPlayed { side, card }];
    let transitions = card.on_played(state);
    events.extend(apply_transitions(state, transitions)?);
    Ok(events)
}

fn apply_transitions(
    state: &mut GameState,
    transitions: Vec<PhaseTransition>,
) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    for transition in transitions {
        let applied = match transition {
            PhaseTransition::Push(phase) => state.push_phase(phase)?,
            PhaseTransition::Replace(phase) => state.replace_phase(phase)?,
        };
        events.extend(applied);
    }
    Ok(events)
}

/// Hexes an ordered unit at `from` can reach, with the steps taken.
///
/// Paths run over empty, on-board, passable hexes; a hex that stops movement
/// may be entered but not left.
pub(crate) fn reachable_hexes(
    state: &GameState,
    from: HexCoord,
    range: u8,
) -> BTreeMap<HexCoord, u8> {
    let mut reached = BTreeMap::new();
    let mut frontier = vec![from];
    for step in 1..=range {
        let mut next = Vec::new();
        for hex in frontier {
            if hex != from && state.terrain_at(hex).stops_movement() {
                continue;
            }
            for neighbor in hex.neighbors() {
                if neighbor == from
                    || reached.contains_key(&neighbor)
                    || !neighbor.is_on_board()
                    || state.terrain_at(neighbor).is_impassable()
                    || state.unit_at(neighbor).is_some()
                {
                    continue;
                }
                reached.insert(neighbor, step);
                next.push(neighbor);
            }
        }
        frontier = next;
    }
    reached
}

fn move_unit(state: &mut GameState, from: HexCoord, to: HexCoord) -> Result<Vec<Event>> {
    let unit = *state.unit_at(from).ok_or(RulesError::NoUnitAt(from))?;
    let steps = reachable_hexes(state, from, unit.kind.move_range())
        .get(&to)
        .copied()
        .ok_or_else(|| RulesError::IllegalMove(format!("{unit} cannot reach {to}")))?;

    state.relocate_unit(from, to)?;
    let forfeits =
        steps > unit.kind.move_and_battle_range() || state.terrain_at(to).stops_movement();
    let unit_state = state.unit_state_mut(unit.id)?;
    unit_state.moved = true;
    if forfeits {
        unit_state.skips_battle = true;
    }
    Ok(vec![Event::UnitMoved { unit, from, to }])
}

fn confirm_targets(state: &mut GameState) -> Result<Vec<Event>> {
    let Phase::SelectTargets(rule) = state.current_phase().clone() else {
        return Err(wrong_phase(state, PhaseKind::SelectTargets));
    };
    let targets = state.selected_targets();
    for &target in &targets {
        state.enqueue_task(DeferredTask::Combat(CombatTask {
            target,
            dice: rule.dice_per_target,
            stars_hit: rule.stars_hit,
        }));
    }
    state.enqueue_task(DeferredTask::EndTurn);
    state.clear_targets();

    let mut events = vec![Event::TargetsConfirmed {
        count: targets.len(),
    }];
    events.extend(state.pop_phase()?);
    Ok(events)
}

fn end_phase(state: &mut GameState) -> Result<Vec<Event>> {
    match state.current_phase().clone() {
        Phase::Order { card } if card.after_orders() == AfterOrders::Fortify => {
            let mut events = Vec::new();
            for hex in state.ordered_units() {
                state.set_fortification(hex, Fortification::Sandbag);
                events.push(Event::SandbagPlaced { at: hex });
            }
            events.extend(state.pop_phase()?);
            events.extend(state.end_turn());
            Ok(events)
        }
        Phase::Order { card } => apply_transitions(state, card.on_orders_confirmed()),
        Phase::Move { card } => state.replace_phase(Phase::Battle { card }),
        Phase::Battle { .. } => {
            let mut events = state.pop_phase()?;
            events.extend(state.end_turn());
            Ok(events)
        }
        Phase::ArmorOverrun { .. } => state.pop_phase(),
        other => Err(RulesError::IllegalMove(format!(
            "phase '{}' cannot be ended",
            other.name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::SharedDice;
    use crate::game::GameConfig;
    use crate::terrain::Terrain;
    use crate::units::Side;

    fn empty_game() -> GameState {
        GameState::new(GameConfig::default(), SharedDice::scripted([]))
    }

    #[test]
    fn test_reach_open_ground() {
        let mut state = empty_game();
        let from = HexCoord::from_offset(6, 4);
        state.place_unit(Side::Allies, UnitKind::Infantry, from, None).unwrap();
        let reach = reachable_hexes(&state, from, 2);
        assert_eq!(reach.len(), 18);
        assert!(reach.values().all(|&s| s == 1 || s == 2));
        assert!(!reach.contains_key(&from));
    }

    #[test]
    fn test_reach_blocked_by_river_and_units() {
        let mut state = empty_game();
        let from = HexCoord::from_offset(6, 4);
        state.place_unit(Side::Allies, UnitKind::Infantry, from, None).unwrap();
        let east = from.offset_by(1, 0);
        let west = from.offset_by(-1, 0);
        state.set_terrain(east, Terrain::River).unwrap();
        state.place_unit(Side::Axis, UnitKind::Infantry, west, None).unwrap();
        let reach = reachable_hexes(&state, from, 1);
        assert_eq!(reach.len(), 4);
        assert!(!reach.contains_key(&east));
        assert!(!reach.contains_key(&west));
    }

    #[test]
    fn test_forest_ends_movement() {
        let mut state = empty_game();
        let from = HexCoord::from_offset(6, 4);
        state.place_unit(Side::Allies, UnitKind::Armor, from, None).unwrap();
        let forest = from.offset_by(1, 0);
        state.set_terrain(forest, Terrain::Forest).unwrap();
        let reach = reachable_hexes(&state, from, 3);
        assert_eq!(reach.get(&forest), Some(&1));
        // Two east can only be reached around the forest
        assert_eq!(reach.get(&from.offset_by(2, 0)), Some(&3));
    }
}
