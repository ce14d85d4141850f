//! Combat and retreat rules
//!
//! ## Flow of one attack
//! 1. Dice are rolled (sorted by face)
//! 2. Hits are applied; an eliminated unit earns the attacker a medal
//! 3. Flags are turned into a retreat, with unretreatable distance becoming damage
//! 4. A follow-up phase may be requested: take ground, or a retreat choice

use crate::board::{Baseline, HexCoord};
use crate::dice::DieFace;
use crate::error::{Result, RulesError};
use crate::events::Event;
use crate::game::GameState;
use crate::phase::{Phase, Pursuit, RetreatChoice, TakeGroundOffer};
use crate::tasks::CombatTask;
use crate::units::{Unit, UnitKind};

// ============================================================================
// DICE OUTCOMES
// ============================================================================

/// Count the dice that hit a unit of kind `target`.
///
/// Matching unit symbols and grenades always hit; stars only when `stars_hit`.
pub fn count_hits(faces: &[DieFace], target: UnitKind, stars_hit: bool) -> u8 {
    faces
        .iter()
        .filter(|&&face| {
            face == target.symbol()
                || face == DieFace::Grenade
                || (stars_hit && face == DieFace::Star)
        })
        .count() as u8
}

pub fn count_flags(faces: &[DieFace]) -> u8 {
    faces.iter().filter(|&&face| face == DieFace::Flag).count() as u8
}

/// Battle dice for `attacker` at `from` against whatever stands at `to`.
///
/// Base dice for the range, plus the current card's bonus, minus the target's
/// terrain and fortification; each reduction stops at zero.
pub fn dice_count(state: &GameState, attacker: &Unit, from: HexCoord, to: HexCoord) -> u8 {
    let distance = from.distance_to(to);
    let base = attacker.kind.base_dice(distance);
    if base == 0 {
        return 0;
    }
    let bonus = state
        .current_card()
        .map_or(0, |card| card.battle_bonus(attacker.kind, distance));
    (base + bonus)
        .saturating_sub(state.terrain_at(to).dice_reduction(attacker.kind))
        .saturating_sub(state.fortification_at(to).dice_reduction())
}

/// Legal targets for the unit at `from`, with their dice.
///
/// Zero-dice targets are dropped. If any target is adjacent, only adjacent
/// targets remain. The current card may then rule out close or ranged fire.
pub fn battle_targets(state: &GameState, from: HexCoord) -> Vec<(HexCoord, u8)> {
    let Some(attacker) = state.unit_at(from) else {
        return Vec::new();
    };
    let range = attacker.kind.battle_range();

    let mut targets: Vec<(HexCoord, u8)> = state
        .units()
        .filter(|(_, unit)| unit.side != attacker.side)
        .filter_map(|(hex, _)| {
            let distance = from.distance_to(hex);
            if distance == 0 || distance > range || !state.has_line_of_sight(from, hex) {
                return None;
            }
            let dice = dice_count(state, attacker, from, hex);
            (dice > 0).then_some((hex, dice))
        })
        .collect();

    if targets.iter().any(|(hex, _)| from.is_adjacent(*hex)) {
        targets.retain(|(hex, _)| from.is_adjacent(*hex));
    }
    if let Some(card) = state.current_card() {
        targets.retain(|(hex, _)| card.permits_battle_at(from.distance_to(*hex)));
    }
    targets
}

// ============================================================================
// RETREATS
// ============================================================================

/// Hexes reachable by retreating, ring by ring
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetreatPaths {
    rings: Vec<Vec<HexCoord>>,
}

impl RetreatPaths {
    /// Farthest ring that holds at least one hex
    pub fn max_distance(&self) -> u8 {
        (self.rings.len() - 1) as u8
    }

    pub fn ring(&self, distance: u8) -> &[HexCoord] {
        self.rings.get(distance as usize).map_or(&[], |ring| ring.as_slice())
    }
}

/// Expand retreat rings from `start` toward `baseline`, up to `distance`.
///
/// Ring 0 is the start hex. Off-board hexes and those `is_blocked` reports are
/// pruned, duplicates reached from two branches are kept once, and expansion
/// stops at the first empty ring.
pub fn retreat_paths<F>(
    start: HexCoord,
    distance: u8,
    baseline: Baseline,
    is_blocked: F,
) -> RetreatPaths
where
    F: Fn(HexCoord) -> bool,
{
    let mut rings = vec![vec![start]];
    for _ in 0..distance {
        let mut next: Vec<HexCoord> = Vec::new();
        for hex in &rings[rings.len() - 1] {
            for direction in baseline.retreat_directions() {
                let step = hex.neighbor(direction);
                if step.is_on_board() && !is_blocked(step) && !next.contains(&step) {
                    next.push(step);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        rings.push(next);
    }
    RetreatPaths { rings }
}

/// Damage taken and hexes offered after flags are rolled
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlagResult {
    pub damage: u8,
    pub candidates: Vec<HexCoord>,
}

/// Turn `flag_count` flags into damage and retreat candidates.
///
/// When an ignorable flag lets the unit complete its (shorter) retreat with no
/// damage, both the shortened and the full retreat are offered; for a single
/// flag the shortened retreat is the start hex, i.e. holding position.
/// Otherwise the full distance is required and any shortfall is damage.
pub fn handle_flags(flag_count: u8, ignorable: u8, paths: &RetreatPaths) -> FlagResult {
    if flag_count == 0 {
        return FlagResult {
            damage: 0,
            candidates: Vec::new(),
        };
    }

    let ignorable = ignorable.min(flag_count);
    if ignorable > 0 {
        let shortened = flag_count - ignorable;
        if paths.max_distance() >= shortened {
            let mut candidates = paths.ring(shortened).to_vec();
            if paths.max_distance() >= flag_count {
                candidates.extend_from_slice(paths.ring(flag_count));
            }
            return FlagResult {
                damage: 0,
                candidates,
            };
        }
    }

    let achieved = paths.max_distance().min(flag_count);
    let candidates = if achieved > 0 {
        paths.ring(achieved).to_vec()
    } else {
        Vec::new()
    };
    FlagResult {
        damage: flag_count - achieved,
        candidates,
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Phase an attack asks for once it is resolved
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum FollowUp {
    Nothing,
    TakeGround(TakeGroundOffer),
    Retreat(RetreatChoice),
}

/// Execute a battle from `from` against `to` with `dice` dice
pub(crate) fn battle(
    state: &mut GameState,
    from: HexCoord,
    to: HexCoord,
    dice: u8,
    pops_phase: bool,
) -> Result<Vec<Event>> {
    let attacker = *state.unit_at(from).ok_or(RulesError::NoUnitAt(from))?;
    let faces = state.dice().roll(dice as usize)?;
    state.unit_state_mut(attacker.id)?.battles_this_turn += 1;

    let pursuit = from.is_adjacent(to).then_some(Pursuit {
        attacker_hex: from,
        overrun_used: pops_phase,
    });
    let (mut events, follow_up) = resolve_attack(state, to, faces, false, pursuit)?;
    if pops_phase {
        events.extend(state.pop_phase()?);
    }
    events.extend(apply_follow_up(state, follow_up)?);
    Ok(events)
}

/// Resolve a card attack with no attacking unit (Barrage, Air Power)
pub(crate) fn card_attack(state: &mut GameState, task: &CombatTask) -> Result<Vec<Event>> {
    let faces = state.dice().roll(task.dice as usize)?;
    let (mut events, follow_up) = resolve_attack(state, task.target, faces, task.stars_hit, None)?;
    events.extend(apply_follow_up(state, follow_up)?);
    Ok(events)
}

fn resolve_attack(
    state: &mut GameState,
    target_hex: HexCoord,
    faces: Vec<DieFace>,
    stars_hit: bool,
    pursuit: Option<Pursuit>,
) -> Result<(Vec<Event>, FollowUp)> {
    let target = *state.unit_at(target_hex).ok_or(RulesError::NoUnitAt(target_hex))?;
    let hits = count_hits(&faces, target.kind, stars_hit);
    let flags = count_flags(&faces);
    let mut events = vec![Event::DiceRolled { target, faces }];

    if hits > 0 && apply_damage(state, &target, hits, &mut events)? {
        return Ok((events, take_ground_after(state, pursuit, target_hex)));
    }
    if flags == 0 {
        return Ok((events, FollowUp::Nothing));
    }

    let ignorable = state.fortification_at(target_hex).ignorable_flags();
    let baseline = state.baseline_of(target.side);
    let paths = retreat_paths(target_hex, flags, baseline, |hex| state.blocks_retreat(hex));
    let outcome = handle_flags(flags, ignorable, &paths);
    tracing::debug!(
        "{} flag(s) on {}: damage {}, {} candidate(s)",
        flags,
        target,
        outcome.damage,
        outcome.candidates.len()
    );

    if outcome.damage > 0 && apply_damage(state, &target, outcome.damage, &mut events)? {
        return Ok((events, take_ground_after(state, pursuit, target_hex)));
    }

    match outcome.candidates.as_slice() {
        [] => Ok((events, FollowUp::Nothing)),
        &[only] => {
            retreat_unit(state, target_hex, only, &mut events)?;
            let follow_up = if only == target_hex {
                FollowUp::Nothing
            } else {
                take_ground_after(state, pursuit, target_hex)
            };
            Ok((events, follow_up))
        }
        candidates => {
            events.push(Event::RetreatOffered {
                unit: target,
                options: candidates.len(),
            });
            let choice = RetreatChoice {
                unit_hex: target_hex,
                candidates: candidates.to_vec(),
                pursuit,
            };
            Ok((events, FollowUp::Retreat(choice)))
        }
    }
}

/// Apply `hits`; returns true if the unit was eliminated
fn apply_damage(
    state: &mut GameState,
    unit: &Unit,
    hits: u8,
    events: &mut Vec<Event>,
) -> Result<bool> {
    let hex = state.position_of(unit.id)?;
    let unit_state = state.unit_state_mut(unit.id)?;
    let taken = hits.min(unit_state.strength);
    unit_state.strength -= taken;
    let remaining = unit_state.strength;
    events.push(Event::UnitHit {
        unit: *unit,
        hits: taken,
        remaining,
    });
    if remaining > 0 {
        return Ok(false);
    }

    state.remove_unit(hex)?;
    events.push(Event::UnitEliminated { unit: *unit, at: hex });
    let side = unit.side.opponent();
    let total = state.award_medal(side, *unit);
    events.push(Event::MedalAwarded { side, total });
    Ok(true)
}

/// Move a retreating unit, or record that it held its ground
pub(crate) fn retreat_unit(
    state: &mut GameState,
    from: HexCoord,
    to: HexCoord,
    events: &mut Vec<Event>,
) -> Result<()> {
    let unit = *state.unit_at(from).ok_or(RulesError::NoUnitAt(from))?;
    if to == from {
        events.push(Event::FlagIgnored { unit, at: from });
    } else {
        state.relocate_unit(from, to)?;
        events.push(Event::UnitRetreated { unit, from, to });
    }
    Ok(())
}

/// Offer the close-combat attacker the vacated hex, if it is still there
pub(crate) fn take_ground_after(
    state: &GameState,
    pursuit: Option<Pursuit>,
    vacated: HexCoord,
) -> FollowUp {
    match pursuit {
        Some(p) if state.unit_at(p.attacker_hex).is_some() && state.unit_at(vacated).is_none() => {
            FollowUp::TakeGround(TakeGroundOffer {
                attacker_hex: p.attacker_hex,
                vacated,
                overrun_used: p.overrun_used,
            })
        }
        _ => FollowUp::Nothing,
    }
}

pub(crate) fn apply_follow_up(state: &mut GameState, follow_up: FollowUp) -> Result<Vec<Event>> {
    match follow_up {
        FollowUp::Nothing => Ok(Vec::new()),
        FollowUp::TakeGround(offer) => state.push_phase(Phase::TakeGround(offer)),
        FollowUp::Retreat(choice) => state.push_phase(Phase::Retreat(choice)),
    }
}
