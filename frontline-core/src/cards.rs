//! Command cards and the deck
//!
//! A card never touches the game state directly. Playing it yields a list of
//! [`PhaseTransition`]s for the orchestrator to apply, and ordering cards carry
//! an [`OrderRule`] that the Order phase consults.

use crate::board::{flanks_of, Flank, HexCoord};
use crate::game::GameState;
use crate::phase::{Phase, TargetRule};
use crate::units::{Side, Unit, UnitKind};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Barrage: dice rolled against its single target
const BARRAGE_DICE: u8 = 4;

/// Air Power: most targets in one strike
const AIR_POWER_TARGETS: u8 = 4;

/// A command card
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Card {
    Probe(Flank),
    Attack(Flank),
    Assault(Flank),
    Recon(Flank),
    GeneralAdvance,
    PincerMove,
    DirectFromHq,
    MoveOut,
    ArmorAssault,
    Firefight,
    CloseAssault,
    DigIn,
    Barrage,
    AirPower,
}

/// Stack operation requested by a card
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhaseTransition {
    Push(Phase),
    Replace(Phase),
}

/// What follows once the Order phase is confirmed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AfterOrders {
    Move,
    Battle,
    Fortify,
}

impl Card {
    /// Phase transitions applied when the card is played
    pub fn on_played(self, state: &GameState) -> Vec<PhaseTransition> {
        match self {
            Card::Barrage => vec![PhaseTransition::Push(Phase::SelectTargets(TargetRule {
                max_targets: 1,
                contiguous: false,
                dice_per_target: BARRAGE_DICE,
                stars_hit: false,
            }))],
            Card::AirPower => {
                let dice_per_target = match state.turn_side() {
                    Side::Allies => 2,
                    Side::Axis => 1,
                };
                vec![PhaseTransition::Push(Phase::SelectTargets(TargetRule {
                    max_targets: AIR_POWER_TARGETS,
                    contiguous: true,
                    dice_per_target,
                    stars_hit: true,
                }))]
            }
            _ => vec![PhaseTransition::Push(Phase::Order { card: self })],
        }
    }

    pub fn order_rule(self) -> OrderRule {
        use Quota::*;
        use UnitFilter::*;
        let (filter, quota) = match self {
            Card::Probe(flank) => (InFlank(flank), Total(2)),
            Card::Attack(flank) => (InFlank(flank), Total(3)),
            Card::Assault(flank) => (InFlank(flank), Unlimited),
            Card::Recon(flank) => (InFlank(flank), Total(1)),
            Card::GeneralAdvance => (Any, PerFlank([2, 2, 2])),
            Card::PincerMove => (Any, PerFlank([2, 0, 2])),
            Card::DirectFromHq => (Any, Total(4)),
            Card::MoveOut => (Kind(UnitKind::Infantry), Total(4)),
            Card::ArmorAssault => (Kind(UnitKind::Armor), Total(4)),
            Card::Firefight => (Any, Total(4)),
            Card::CloseAssault => (AdjacentToEnemy, Unlimited),
            Card::DigIn => (Kind(UnitKind::Infantry), Total(4)),
            Card::Barrage | Card::AirPower => (Any, Total(0)),
        };
        OrderRule { filter, quota }
    }

    pub fn after_orders(self) -> AfterOrders {
        match self {
            Card::Firefight | Card::CloseAssault => AfterOrders::Battle,
            Card::DigIn => AfterOrders::Fortify,
            _ => AfterOrders::Move,
        }
    }

    /// Transitions applied when the Order phase ends; fortifying cards have none
    pub fn on_orders_confirmed(self) -> Vec<PhaseTransition> {
        match self.after_orders() {
            AfterOrders::Move => vec![PhaseTransition::Replace(Phase::Move { card: self })],
            AfterOrders::Battle => vec![PhaseTransition::Replace(Phase::Battle { card: self })],
            AfterOrders::Fortify => Vec::new(),
        }
    }

    /// Extra battle dice granted by this card
    pub fn battle_bonus(self, attacker: UnitKind, distance: u8) -> u8 {
        match self {
            Card::ArmorAssault if attacker == UnitKind::Armor && distance == 1 => 1,
            Card::CloseAssault if distance == 1 => 1,
            Card::Firefight if distance > 1 => 1,
            _ => 0,
        }
    }

    /// Whether units ordered by this card may battle at `distance`
    pub fn permits_battle_at(self, distance: u8) -> bool {
        match self {
            Card::Firefight => distance > 1,
            Card::CloseAssault => distance == 1,
            _ => true,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Card::Probe(flank) => write!(f, "Probe {flank:?}"),
            Card::Attack(flank) => write!(f, "Attack {flank:?}"),
            Card::Assault(flank) => write!(f, "Assault {flank:?}"),
            Card::Recon(flank) => write!(f, "Recon {flank:?}"),
            Card::GeneralAdvance => f.write_str("General Advance"),
            Card::PincerMove => f.write_str("Pincer Move"),
            Card::DirectFromHq => f.write_str("Direct from HQ"),
            Card::MoveOut => f.write_str("Move Out!"),
            Card::ArmorAssault => f.write_str("Armor Assault"),
            Card::Firefight => f.write_str("Firefight"),
            Card::CloseAssault => f.write_str("Close Assault"),
            Card::DigIn => f.write_str("Dig In"),
            Card::Barrage => f.write_str("Barrage"),
            Card::AirPower => f.write_str("Air Power"),
        }
    }
}

// ============================================================================
// ORDER RULES
// ============================================================================

/// Which units a card may order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitFilter {
    Any,
    Kind(UnitKind),
    InFlank(Flank),
    AdjacentToEnemy,
}

/// How many units a card may order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quota {
    Unlimited,
    Total(u8),
    /// Per flank (left, center, right); straddling units count toward either
    PerFlank([u8; 3]),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderRule {
    pub filter: UnitFilter,
    pub quota: Quota,
}

impl OrderRule {
    /// Can `unit` at `hex` be ordered on top of the already `ordered` hexes
    pub fn can_order(
        &self,
        state: &GameState,
        hex: HexCoord,
        unit: &Unit,
        ordered: &[HexCoord],
    ) -> bool {
        if !self.admits(state, hex, unit) {
            return false;
        }
        match self.quota {
            Quota::Unlimited => true,
            Quota::Total(limit) => ordered.len() < limit as usize,
            Quota::PerFlank(capacity) => {
                let baseline = state.baseline_of(unit.side);
                let sets: Vec<Vec<Flank>> = ordered
                    .iter()
                    .chain(std::iter::once(&hex))
                    .map(|&h| flanks_of(h, baseline))
                    .collect();
                assignable(&sets, capacity)
            }
        }
    }

    fn admits(&self, state: &GameState, hex: HexCoord, unit: &Unit) -> bool {
        match self.filter {
            UnitFilter::Any => true,
            UnitFilter::Kind(kind) => unit.kind == kind,
            UnitFilter::InFlank(flank) => {
                flanks_of(hex, state.baseline_of(unit.side)).contains(&flank)
            }
            UnitFilter::AdjacentToEnemy => hex
                .neighbors()
                .iter()
                .any(|&n| state.unit_at(n).is_some_and(|other| other.side != unit.side)),
        }
    }
}

/// Each unit takes one slot from one of its flanks
fn assignable(sets: &[Vec<Flank>], capacity: [u8; 3]) -> bool {
    let Some((first, rest)) = sets.split_first() else {
        return true;
    };
    first.iter().any(|flank| {
        let i = flank.index();
        if capacity[i] == 0 {
            return false;
        }
        let mut remaining = capacity;
        remaining[i] -= 1;
        assignable(rest, remaining)
    })
}

// ============================================================================
// DECK
// ============================================================================

/// Draw pile plus discards, reshuffled when the pile runs out
#[derive(Clone, Debug)]
pub struct Deck {
    draw_pile: Vec<Card>,
    discards: Vec<Card>,
    rng: ChaCha8Rng,
}

impl Deck {
    pub fn new(cards: Vec<Card>, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut draw_pile = cards;
        draw_pile.shuffle(&mut rng);
        Self {
            draw_pile,
            discards: Vec::new(),
            rng,
        }
    }

    pub fn standard(seed: u64) -> Self {
        Self::new(standard_cards(), seed)
    }

    pub fn draw(&mut self) -> Option<Card> {
        if self.draw_pile.is_empty() {
            self.draw_pile.append(&mut self.discards);
            self.draw_pile.shuffle(&mut self.rng);
        }
        self.draw_pile.pop()
    }

    pub fn discard(&mut self, card: Card) {
        self.discards.push(card);
    }

    pub fn remaining(&self) -> usize {
        self.draw_pile.len()
    }
}

/// The standard card mix
pub fn standard_cards() -> Vec<Card> {
    let mut cards = Vec::new();
    for (flank, probes, attacks) in [
        (Flank::Left, 2, 3),
        (Flank::Center, 4, 4),
        (Flank::Right, 2, 3),
    ] {
        cards.extend(std::iter::repeat(Card::Probe(flank)).take(probes));
        cards.extend(std::iter::repeat(Card::Attack(flank)).take(attacks));
        cards.push(Card::Assault(flank));
        cards.push(Card::Recon(flank));
    }
    cards.extend([
        Card::GeneralAdvance,
        Card::PincerMove,
        Card::DirectFromHq,
        Card::DirectFromHq,
        Card::MoveOut,
        Card::MoveOut,
        Card::ArmorAssault,
        Card::ArmorAssault,
        Card::Firefight,
        Card::CloseAssault,
        Card::DigIn,
        Card::Barrage,
        Card::AirPower,
    ]);
    cards
}
