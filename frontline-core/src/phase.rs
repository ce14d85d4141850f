//! Phases of a turn
//!
//! The game keeps a stack of phases. The top phase decides which moves are
//! legal; executing a move may push, pop or replace phases. Hooks run when a
//! phase is pushed, removed, or uncovered again by a pop.

use crate::board::HexCoord;
use crate::cards::Card;
use crate::combat::{self, battle_targets};
use crate::error::Result;
use crate::events::Event;
use crate::game::GameState;
use crate::moves::{reachable_hexes, Move};
use crate::tasks::CombatTask;
use serde::Serialize;

/// Tag identifying a phase without its payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PhaseKind {
    PlayCard,
    Order,
    Move,
    Battle,
    Retreat,
    TakeGround,
    ArmorOverrun,
    SelectTargets,
    AutoCombat,
}

/// How a card chooses its targets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetRule {
    pub max_targets: u8,
    /// Each new target must border one already selected
    pub contiguous: bool,
    pub dice_per_target: u8,
    pub stars_hit: bool,
}

/// Close-combat attacker that may follow a vacated hex
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pursuit {
    pub attacker_hex: HexCoord,
    /// The current attack chain has already had its overrun
    pub overrun_used: bool,
}

/// Retreat destinations offered to the defender
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetreatChoice {
    pub unit_hex: HexCoord,
    pub candidates: Vec<HexCoord>,
    pub pursuit: Option<Pursuit>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TakeGroundOffer {
    pub attacker_hex: HexCoord,
    pub vacated: HexCoord,
    pub overrun_used: bool,
}

/// One entry of the phase stack
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Bottom of the stack: awaiting a card
    PlayCard,
    Order { card: Card },
    Move { card: Card },
    Battle { card: Card },
    Retreat(RetreatChoice),
    TakeGround(TakeGroundOffer),
    ArmorOverrun { hex: HexCoord },
    SelectTargets(TargetRule),
    AutoCombat(CombatTask),
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::PlayCard => "awaiting card play",
            Phase::Order { .. } => "order units",
            Phase::Move { .. } => "move units",
            Phase::Battle { .. } => "battle",
            Phase::Retreat(_) => "retreat",
            Phase::TakeGround(_) => "take ground",
            Phase::ArmorOverrun { .. } => "armor overrun",
            Phase::SelectTargets(_) => "select targets",
            Phase::AutoCombat(_) => "card attack",
        }
    }

    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::PlayCard => PhaseKind::PlayCard,
            Phase::Order { .. } => PhaseKind::Order,
            Phase::Move { .. } => PhaseKind::Move,
            Phase::Battle { .. } => PhaseKind::Battle,
            Phase::Retreat(_) => PhaseKind::Retreat,
            Phase::TakeGround(_) => PhaseKind::TakeGround,
            Phase::ArmorOverrun { .. } => PhaseKind::ArmorOverrun,
            Phase::SelectTargets(_) => PhaseKind::SelectTargets,
            Phase::AutoCombat(_) => PhaseKind::AutoCombat,
        }
    }

    // ========================================================================
    // HOOKS
    // ========================================================================

    /// Runs right after the phase lands on top of the stack
    pub(crate) fn on_pushed(&self, state: &mut GameState) -> Result<Vec<Event>> {
        match self {
            Phase::Retreat(_) => {
                state.set_retreat_switch(true);
                Ok(Vec::new())
            }
            Phase::ArmorOverrun { hex } => Ok(state
                .unit_at(*hex)
                .map(|&unit| vec![Event::OverrunOffered { unit, at: *hex }])
                .unwrap_or_default()),
            Phase::AutoCombat(task) => {
                let mut events = combat::card_attack(state, task)?;
                if state.phase_kind() == PhaseKind::AutoCombat {
                    events.extend(state.pop_phase()?);
                }
                Ok(events)
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Runs right after the phase leaves the stack
    pub(crate) fn on_removed(&self, state: &mut GameState) -> Result<Vec<Event>> {
        if let Phase::Retreat(_) = self {
            state.set_retreat_switch(false);
        }
        Ok(Vec::new())
    }

    /// Runs when a pop leaves this phase on top again
    pub(crate) fn on_popped_up(&self, state: &mut GameState) -> Result<Vec<Event>> {
        match self {
            // The retreat this attack was waiting on is settled
            Phase::AutoCombat(_) => state.pop_phase(),
            _ => Ok(Vec::new()),
        }
    }

    // ========================================================================
    // LEGAL MOVES
    // ========================================================================

    /// Moves available while this phase is on top, in a stable order
    pub fn legal_moves(&self, state: &GameState) -> Vec<Move> {
        match self {
            Phase::PlayCard => {
                let mut cards: Vec<Card> = Vec::new();
                for &card in state.hand(state.turn_side()) {
                    if !cards.contains(&card) {
                        cards.push(card);
                    }
                }
                cards.into_iter().map(|card| Move::PlayCard { card }).collect()
            }
            Phase::Order { card } => order_moves(state, *card),
            Phase::Move { .. } => {
                let mut moves = Vec::new();
                for (hex, unit) in state.friendly_units(state.turn_side()) {
                    let Some(unit_state) = state.unit_state_at(hex) else {
                        continue;
                    };
                    if !unit_state.ordered || unit_state.moved {
                        continue;
                    }
                    for (to, _) in reachable_hexes(state, hex, unit.kind.move_range()) {
                        moves.push(Move::MoveUnit { from: hex, to });
                    }
                }
                moves.push(Move::EndPhase);
                moves
            }
            Phase::Battle { .. } => {
                let mut moves = Vec::new();
                for hex in state.ordered_units() {
                    let Some(unit_state) = state.unit_state_at(hex) else {
                        continue;
                    };
                    if unit_state.battles_this_turn > 0 || unit_state.skips_battle {
                        continue;
                    }
                    for (to, dice) in battle_targets(state, hex) {
                        moves.push(Move::Battle {
                            from: hex,
                            to,
                            dice,
                            pops_phase: false,
                        });
                    }
                }
                moves.push(Move::EndPhase);
                moves
            }
            Phase::Retreat(choice) => choice
                .candidates
                .iter()
                .map(|&to| Move::Retreat {
                    from: choice.unit_hex,
                    to,
                })
                .collect(),
            Phase::TakeGround(offer) => {
                let mut moves = Vec::new();
                if state.unit_at(offer.vacated).is_none() {
                    moves.push(Move::TakeGround {
                        from: offer.attacker_hex,
                        to: offer.vacated,
                    });
                }
                moves.push(Move::DeclineTakeGround {
                    hex: offer.attacker_hex,
                });
                moves
            }
            Phase::ArmorOverrun { hex } => {
                let mut moves: Vec<Move> = battle_targets(state, *hex)
                    .into_iter()
                    .map(|(to, dice)| Move::Battle {
                        from: *hex,
                        to,
                        dice,
                        pops_phase: true,
                    })
                    .collect();
                moves.push(Move::EndPhase);
                moves
            }
            Phase::SelectTargets(rule) => target_moves(state, rule),
            Phase::AutoCombat(_) => Vec::new(),
        }
    }
}

fn order_moves(state: &GameState, card: Card) -> Vec<Move> {
    let rule = card.order_rule();
    let ordered = state.ordered_units();
    let mut moves = Vec::new();
    for (hex, unit) in state.friendly_units(state.turn_side()) {
        if ordered.contains(&hex) {
            moves.push(Move::UnOrderUnit { hex });
        } else if rule.can_order(state, hex, unit, &ordered) {
            moves.push(Move::OrderUnit { hex });
        }
    }
    moves.push(Move::EndPhase);
    moves
}

fn target_moves(state: &GameState, rule: &TargetRule) -> Vec<Move> {
    let side = state.turn_side();
    let selected = state.selected_targets();
    let mut moves = Vec::new();
    let mut candidates = 0;

    for (hex, _) in state.enemy_units(side) {
        if selected.contains(&hex) {
            let rest: Vec<HexCoord> = selected.iter().copied().filter(|&h| h != hex).collect();
            if !rule.contiguous || is_connected(&rest) {
                moves.push(Move::UnSelectTarget { hex });
            }
            continue;
        }
        candidates += 1;
        if selected.len() >= rule.max_targets as usize {
            continue;
        }
        if rule.contiguous && !selected.is_empty() && !selected.iter().any(|s| s.is_adjacent(hex)) {
            continue;
        }
        moves.push(Move::SelectTarget { hex });
    }

    if !selected.is_empty() || candidates == 0 {
        moves.push(Move::ConfirmTargets);
    }
    moves
}

/// Whether `hexes` form one group through adjacency
pub(crate) fn is_connected(hexes: &[HexCoord]) -> bool {
    let Some(&first) = hexes.first() else {
        return true;
    };
    let mut reached = vec![first];
    let mut frontier = vec![first];
    while let Some(hex) = frontier.pop() {
        for &other in hexes {
            if !reached.contains(&other) && other.is_adjacent(hex) {
                reached.push(other);
                frontier.push(other);
            }
        }
    }
    reached.len() == hexes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity() {
        let a = HexCoord::new(3, 3);
        let b = HexCoord::new(4, 3);
        let c = HexCoord::new(5, 3);
        assert!(is_connected(&[]));
        assert!(is_connected(&[a]));
        assert!(is_connected(&[a, b, c]));
        assert!(!is_connected(&[a, c]));
    }

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(Phase::PlayCard.kind(), PhaseKind::PlayCard);
        assert_eq!(
            Phase::ArmorOverrun { hex: HexCoord::new(0, 0) }.kind(),
            PhaseKind::ArmorOverrun
        );
        assert_eq!(Phase::Battle { card: Card::Firefight }.name(), "battle");
    }
}
