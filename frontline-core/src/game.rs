//! Game state and the phase-stack orchestrator

use crate::board::{line_of_sight, Baseline, HexCoord};
use crate::cards::{Card, Deck};
use crate::dice::SharedDice;
use crate::error::{Result, RulesError};
use crate::events::Event;
use crate::moves::Move;
use crate::phase::{Phase, PhaseKind};
use crate::tasks::{DeferredTask, TaskStatus};
use crate::terrain::{Fortification, FortificationMap, Terrain, TerrainMap};
use crate::units::{Side, Unit, UnitId, UnitKind, UnitState};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Medals needed to win unless a scenario says otherwise
pub const DEFAULT_MEDALS_TO_WIN: usize = 6;

/// Bottom of every phase stack
static AWAITING_CARD: Phase = Phase::PlayCard;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Game result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Ongoing,
    Victory(Side),
}

/// Fixed parameters of one game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub medals_to_win: usize,
    /// Side whose baseline is row 0
    pub north_side: Side,
    pub first_side: Side,
    pub deck_seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            medals_to_win: DEFAULT_MEDALS_TO_WIN,
            north_side: Side::Axis,
            first_side: Side::Allies,
            deck_seed: 0,
        }
    }
}

/// Complete game state.
///
/// `Clone` copies everything except the dice: clones keep drawing from the
/// same source, so replaying moves on a clone consumes the shared stream.
#[derive(Clone, Debug)]
pub struct GameState {
    phases: Vec<Phase>,
    turn_side: Side,
    /// Set while a retreat phase hands the decision to the defender
    retreat_switch: bool,
    north_side: Side,

    units: FxHashMap<UnitId, Unit>,
    positions: BTreeMap<HexCoord, UnitId>,
    locations: FxHashMap<UnitId, HexCoord>,
    unit_states: FxHashMap<UnitId, UnitState>,
    next_unit_id: u32,

    terrain: TerrainMap,
    fortifications: FortificationMap,
    dice: SharedDice,

    medals: [Vec<Unit>; 2],
    medals_to_win: usize,
    hands: [Vec<Card>; 2],
    deck: Deck,
    current_card: Option<Card>,

    tasks: VecDeque<DeferredTask>,
    next_target_ordinal: u32,
    result: GameResult,
    log: Vec<Event>,
}

impl GameState {
    pub fn new(config: GameConfig, dice: SharedDice) -> Self {
        Self {
            phases: vec![Phase::PlayCard],
            turn_side: config.first_side,
            retreat_switch: false,
            north_side: config.north_side,
            units: FxHashMap::default(),
            positions: BTreeMap::new(),
            locations: FxHashMap::default(),
            unit_states: FxHashMap::default(),
            next_unit_id: 1,
            terrain: TerrainMap::new(),
            fortifications: FortificationMap::new(),
            dice,
            medals: [Vec::new(), Vec::new()],
            medals_to_win: config.medals_to_win,
            hands: [Vec::new(), Vec::new()],
            deck: Deck::standard(config.deck_seed),
            current_card: None,
            tasks: VecDeque::new(),
            next_target_ordinal: 0,
            result: GameResult::Ongoing,
            log: Vec::new(),
        }
    }

    // ========================================================================
    // SETUP
    // ========================================================================

    /// Place a new unit; `strength` overrides the kind's default
    pub fn place_unit(
        &mut self,
        side: Side,
        kind: UnitKind,
        hex: HexCoord,
        strength: Option<u8>,
    ) -> Result<UnitId> {
        if !hex.is_on_board() {
            return Err(RulesError::OffBoard(hex));
        }
        if self.positions.contains_key(&hex) {
            return Err(RulesError::HexOccupied(hex));
        }
        let starting_strength = strength.unwrap_or_else(|| kind.default_strength());
        if starting_strength == 0 {
            return Err(RulesError::ZeroStrength(hex));
        }
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        self.units.insert(
            id,
            Unit {
                id,
                side,
                kind,
                starting_strength,
            },
        );
        self.positions.insert(hex, id);
        self.locations.insert(id, hex);
        self.unit_states.insert(id, UnitState::new(starting_strength));
        Ok(id)
    }

    pub fn set_terrain(&mut self, hex: HexCoord, terrain: Terrain) -> Result<()> {
        self.terrain.set(hex, terrain)
    }

    /// Lock the terrain map for the rest of the game
    pub fn freeze_terrain(&mut self) {
        self.terrain.freeze();
    }

    pub fn set_fortification(&mut self, hex: HexCoord, fortification: Fortification) {
        self.fortifications.set(hex, fortification);
    }

    pub fn set_hand(&mut self, side: Side, cards: Vec<Card>) {
        self.hands[side.index()] = cards;
    }

    /// Draw `count` cards from the deck into `side`'s hand
    pub fn deal(&mut self, side: Side, count: usize) {
        for _ in 0..count {
            match self.deck.draw() {
                Some(card) => self.hands[side.index()].push(card),
                None => break,
            }
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn unit_at(&self, hex: HexCoord) -> Option<&Unit> {
        self.positions.get(&hex).and_then(|id| self.units.get(id))
    }

    pub fn unit_state_at(&self, hex: HexCoord) -> Option<&UnitState> {
        self.positions.get(&hex).and_then(|id| self.unit_states.get(id))
    }

    pub fn unit_state(&self, id: UnitId) -> Option<&UnitState> {
        self.unit_states.get(&id)
    }

    pub fn position_of(&self, id: UnitId) -> Result<HexCoord> {
        self.locations
            .get(&id)
            .copied()
            .ok_or(RulesError::UnitNotOnBoard(id.0))
    }

    /// Units on the board with their hexes, row-major
    pub fn units(&self) -> impl Iterator<Item = (HexCoord, &Unit)> + '_ {
        self.positions
            .iter()
            .filter_map(|(&hex, id)| self.units.get(id).map(|unit| (hex, unit)))
    }

    pub fn friendly_units(&self, side: Side) -> Vec<(HexCoord, &Unit)> {
        self.units().filter(|(_, unit)| unit.side == side).collect()
    }

    pub fn enemy_units(&self, side: Side) -> Vec<(HexCoord, &Unit)> {
        self.friendly_units(side.opponent())
    }

    /// Hexes of the turn side's ordered units
    pub fn ordered_units(&self) -> Vec<HexCoord> {
        self.units()
            .filter(|(_, unit)| unit.side == self.turn_side)
            .filter(|(hex, _)| self.unit_state_at(*hex).is_some_and(|s| s.ordered))
            .map(|(hex, _)| hex)
            .collect()
    }

    /// Hexes currently chosen as card targets, in selection order
    pub fn selected_targets(&self) -> Vec<HexCoord> {
        let mut selected: Vec<(u32, HexCoord)> = self
            .positions
            .iter()
            .filter_map(|(&hex, id)| {
                self.unit_states
                    .get(id)
                    .and_then(|s| s.targeted)
                    .map(|ordinal| (ordinal, hex))
            })
            .collect();
        selected.sort_unstable();
        selected.into_iter().map(|(_, hex)| hex).collect()
    }

    pub fn current_phase(&self) -> &Phase {
        self.phases.last().unwrap_or(&AWAITING_CARD)
    }

    pub fn phase_kind(&self) -> PhaseKind {
        self.current_phase().kind()
    }

    pub fn phase_depth(&self) -> usize {
        self.phases.len()
    }

    pub fn turn_side(&self) -> Side {
        self.turn_side
    }

    /// Side making the next decision; the defender during a retreat
    pub fn active_side(&self) -> Side {
        if self.retreat_switch {
            self.turn_side.opponent()
        } else {
            self.turn_side
        }
    }

    pub fn baseline_of(&self, side: Side) -> Baseline {
        if side == self.north_side {
            Baseline::North
        } else {
            Baseline::South
        }
    }

    /// Medals won by `side`: the enemy units it eliminated, in order
    pub fn medals(&self, side: Side) -> &[Unit] {
        &self.medals[side.index()]
    }

    pub fn medals_to_win(&self) -> usize {
        self.medals_to_win
    }

    pub fn terrain_at(&self, hex: HexCoord) -> Terrain {
        self.terrain.get(hex)
    }

    pub fn fortification_at(&self, hex: HexCoord) -> Fortification {
        self.fortifications.get(hex)
    }

    pub fn hand(&self, side: Side) -> &[Card] {
        &self.hands[side.index()]
    }

    pub fn current_card(&self) -> Option<Card> {
        self.current_card
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    /// Every event since the game started
    pub fn events(&self) -> &[Event] {
        &self.log
    }

    pub fn dice(&self) -> &SharedDice {
        &self.dice
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Units and terrain block sight; the endpoints never do
    pub fn has_line_of_sight(&self, from: HexCoord, to: HexCoord) -> bool {
        line_of_sight(from, to, |hex| {
            self.positions.contains_key(&hex) || self.terrain.get(hex).blocks_line_of_sight()
        })
    }

    pub(crate) fn blocks_retreat(&self, hex: HexCoord) -> bool {
        self.positions.contains_key(&hex) || self.terrain.get(hex).is_impassable()
    }

    pub(crate) fn has_paused_combat(&self) -> bool {
        self.phases.iter().any(|p| p.kind() == PhaseKind::AutoCombat)
    }

    // ========================================================================
    // PHASE STACK
    // ========================================================================

    pub fn push_phase(&mut self, phase: Phase) -> Result<Vec<Event>> {
        tracing::debug!("push phase '{}'", phase.name());
        self.phases.push(phase.clone());
        phase.on_pushed(self)
    }

    /// Pop the top phase; the bottom phase can never be popped
    pub fn pop_phase(&mut self) -> Result<Vec<Event>> {
        if self.phases.len() <= 1 {
            return Err(RulesError::EmptyPhaseStack);
        }
        let popped = self.phases.pop().ok_or(RulesError::EmptyPhaseStack)?;
        tracing::debug!("pop phase '{}'", popped.name());
        let mut events = popped.on_removed(self)?;
        let uncovered = self.current_phase().clone();
        events.extend(uncovered.on_popped_up(self)?);
        Ok(events)
    }

    /// Swap the top phase for `phase` without uncovering the one beneath
    pub fn replace_phase(&mut self, phase: Phase) -> Result<Vec<Event>> {
        if self.phases.len() <= 1 {
            return Err(RulesError::EmptyPhaseStack);
        }
        let replaced = self.phases.pop().ok_or(RulesError::EmptyPhaseStack)?;
        tracing::debug!("replace phase '{}' with '{}'", replaced.name(), phase.name());
        let mut events = replaced.on_removed(self)?;
        self.phases.push(phase.clone());
        events.extend(phase.on_pushed(self)?);
        Ok(events)
    }

    /// Close the turn: reset orders, discard the card, draw, switch sides
    pub fn end_turn(&mut self) -> Vec<Event> {
        for unit_state in self.unit_states.values_mut() {
            unit_state.reset_turn();
        }
        if let Some(card) = self.current_card.take() {
            self.deck.discard(card);
        }

        let side = self.turn_side;
        let mut events = Vec::new();
        if let Some(card) = self.deck.draw() {
            self.hands[side.index()].push(card);
            events.push(Event::CardDrawn { side });
        }
        self.turn_side = side.opponent();
        self.next_target_ordinal = 0;
        tracing::debug!("turn over, {} to play", self.turn_side);
        events.push(Event::TurnEnded {
            next: self.turn_side,
        });
        events
    }

    // ========================================================================
    // MOVES
    // ========================================================================

    /// Moves available to the active side; empty once the game is decided
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.result != GameResult::Ongoing {
            return Vec::new();
        }
        self.current_phase().legal_moves(self)
    }

    /// Execute a legal move, then run any deferred tasks it released
    pub fn execute_move(&mut self, mv: &Move) -> Result<Vec<Event>> {
        if self.result != GameResult::Ongoing {
            return Err(RulesError::GameOver);
        }
        if !self.legal_moves().contains(mv) {
            return Err(RulesError::IllegalMove(format!(
                "{:?} during '{}'",
                mv,
                self.current_phase().name()
            )));
        }

        let mut events = mv.execute(self)?;
        self.check_victory(&mut events);
        events.extend(self.drain_tasks()?);
        self.log.extend(events.iter().cloned());
        Ok(events)
    }

    fn drain_tasks(&mut self) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        while self.result == GameResult::Ongoing && !self.has_paused_combat() {
            let Some(task) = self.tasks.pop_front() else {
                break;
            };
            tracing::debug!("running {:?}", task);
            let (status, task_events) = task.execute(self)?;
            events.extend(task_events);
            self.check_victory(&mut events);
            if status == TaskStatus::Paused {
                tracing::debug!("task paused, {} queued", self.tasks.len());
                break;
            }
        }
        Ok(events)
    }

    fn check_victory(&mut self, events: &mut Vec<Event>) {
        if self.result != GameResult::Ongoing {
            return;
        }
        for side in Side::BOTH {
            if self.medals[side.index()].len() >= self.medals_to_win {
                self.result = GameResult::Victory(side);
                tracing::info!("{} win with {} medals", side, self.medals_to_win);
                events.push(Event::GameWon { side });
                return;
            }
        }
    }

    // ========================================================================
    // MUTATION (rules code only)
    // ========================================================================

    pub(crate) fn unit_state_mut(&mut self, id: UnitId) -> Result<&mut UnitState> {
        self.unit_states
            .get_mut(&id)
            .ok_or(RulesError::UnitNotOnBoard(id.0))
    }

    /// Move the unit at `from` to the empty hex `to`; any sandbag left behind is removed
    pub(crate) fn relocate_unit(&mut self, from: HexCoord, to: HexCoord) -> Result<()> {
        if !to.is_on_board() {
            return Err(RulesError::OffBoard(to));
        }
        if self.positions.contains_key(&to) {
            return Err(RulesError::HexOccupied(to));
        }
        let id = self.positions.remove(&from).ok_or(RulesError::NoUnitAt(from))?;
        self.fortifications.remove(from);
        self.positions.insert(to, id);
        self.locations.insert(id, to);
        Ok(())
    }

    pub(crate) fn remove_unit(&mut self, hex: HexCoord) -> Result<Unit> {
        let id = self.positions.remove(&hex).ok_or(RulesError::NoUnitAt(hex))?;
        self.locations.remove(&id);
        self.unit_states.remove(&id);
        self.fortifications.remove(hex);
        self.units.get(&id).copied().ok_or(RulesError::UnitNotOnBoard(id.0))
    }

    /// Record `unit` as a medal for `side`; returns the new total
    pub(crate) fn award_medal(&mut self, side: Side, unit: Unit) -> usize {
        let medals = &mut self.medals[side.index()];
        medals.push(unit);
        medals.len()
    }

    pub(crate) fn set_retreat_switch(&mut self, on: bool) {
        self.retreat_switch = on;
    }

    pub(crate) fn select_target(&mut self, hex: HexCoord) -> Result<()> {
        let id = *self.positions.get(&hex).ok_or(RulesError::NoUnitAt(hex))?;
        let ordinal = self.next_target_ordinal;
        self.next_target_ordinal += 1;
        self.unit_state_mut(id)?.targeted = Some(ordinal);
        Ok(())
    }

    pub(crate) fn clear_targets(&mut self) {
        for unit_state in self.unit_states.values_mut() {
            unit_state.targeted = None;
        }
    }

    pub(crate) fn enqueue_task(&mut self, task: DeferredTask) {
        self.tasks.push_back(task);
    }

    pub(crate) fn take_from_hand(&mut self, side: Side, card: Card) -> Result<()> {
        let hand = &mut self.hands[side.index()];
        let index = hand
            .iter()
            .position(|&c| c == card)
            .ok_or_else(|| RulesError::IllegalMove(format!("{card} is not in the {side} hand")))?;
        hand.remove(index);
        Ok(())
    }

    pub(crate) fn set_current_card(&mut self, card: Option<Card>) {
        self.current_card = card;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> GameState {
        GameState::new(GameConfig::default(), SharedDice::scripted([]))
    }

    #[test]
    fn test_bottom_phase_cannot_be_popped() {
        let mut state = game();
        assert_eq!(state.phase_kind(), PhaseKind::PlayCard);
        assert_eq!(state.pop_phase(), Err(RulesError::EmptyPhaseStack));
        assert_eq!(
            state.replace_phase(Phase::Battle { card: Card::Firefight }),
            Err(RulesError::EmptyPhaseStack)
        );
        assert_eq!(state.phase_depth(), 1);
    }

    #[test]
    fn test_placement_rules() {
        let mut state = game();
        let hex = HexCoord::from_offset(2, 2);
        let id = state.place_unit(Side::Allies, UnitKind::Armor, hex, None).unwrap();
        assert_eq!(state.position_of(id), Ok(hex));
        assert_eq!(state.unit_state(id).map(|s| s.strength), Some(3));
        assert_eq!(
            state.place_unit(Side::Axis, UnitKind::Infantry, hex, None),
            Err(RulesError::HexOccupied(hex))
        );
        let off = HexCoord::from_offset(-1, 2);
        assert_eq!(
            state.place_unit(Side::Axis, UnitKind::Infantry, off, None),
            Err(RulesError::OffBoard(off))
        );
        let empty = HexCoord::from_offset(3, 2);
        assert_eq!(
            state.place_unit(Side::Axis, UnitKind::Infantry, empty, Some(0)),
            Err(RulesError::ZeroStrength(empty))
        );
        assert!(state.unit_at(empty).is_none());
    }

    #[test]
    fn test_leaving_sandbag_removes_it() {
        let mut state = game();
        let from = HexCoord::from_offset(4, 4);
        let to = from.offset_by(1, 0);
        state.place_unit(Side::Allies, UnitKind::Infantry, from, None).unwrap();
        state.set_fortification(from, Fortification::Sandbag);
        state.relocate_unit(from, to).unwrap();
        assert_eq!(state.fortification_at(from), Fortification::None);
        assert!(state.unit_at(from).is_none());
        assert!(state.unit_at(to).is_some());
    }

    #[test]
    fn test_end_turn_resets_and_switches() {
        let mut state = game();
        let hex = HexCoord::from_offset(4, 4);
        let id = state.place_unit(Side::Allies, UnitKind::Infantry, hex, None).unwrap();
        state.unit_state_mut(id).unwrap().ordered = true;
        let before = state.hand(Side::Allies).len();
        let events = state.end_turn();
        assert_eq!(state.turn_side(), Side::Axis);
        assert!(!state.unit_state(id).unwrap().ordered);
        assert_eq!(state.hand(Side::Allies).len(), before + 1);
        assert_eq!(events.last(), Some(&Event::TurnEnded { next: Side::Axis }));
    }

    #[test]
    fn test_unit_not_on_board() {
        let state = game();
        assert_eq!(state.position_of(UnitId(42)), Err(RulesError::UnitNotOnBoard(42)));
        assert_eq!(
            state.dice().roll(1),
            Err(RulesError::InsufficientScriptedResults { requested: 1, remaining: 0 })
        );
    }
}
