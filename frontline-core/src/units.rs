//! Unit definitions and per-unit battle state

use crate::dice::DieFace;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side in the battle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Allies,
    Axis,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Allies, Side::Axis];

    pub fn opponent(self) -> Self {
        match self {
            Side::Allies => Side::Axis,
            Side::Axis => Side::Allies,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Allies => 0,
            Side::Axis => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Allies => f.write_str("Allies"),
            Side::Axis => f.write_str("Axis"),
        }
    }
}

/// Unit type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    Infantry,
    Armor,
}

/// Battle dice by range bracket; index 0 is range 1
const INFANTRY_DICE: [u8; 3] = [3, 2, 1];
const ARMOR_DICE: [u8; 3] = [3, 3, 3];

impl UnitKind {
    pub fn default_strength(self) -> u8 {
        match self {
            UnitKind::Infantry => 4,
            UnitKind::Armor => 3,
        }
    }

    /// Maximum hexes moved in one turn
    pub fn move_range(self) -> u8 {
        match self {
            UnitKind::Infantry => 2,
            UnitKind::Armor => 3,
        }
    }

    /// Longest move after which this unit may still battle
    pub fn move_and_battle_range(self) -> u8 {
        match self {
            UnitKind::Infantry => 1,
            UnitKind::Armor => 3,
        }
    }

    pub fn battle_range(self) -> u8 {
        self.dice_table().len() as u8
    }

    /// Base dice against a target `distance` hexes away (0 when out of range)
    pub fn base_dice(self, distance: u8) -> u8 {
        if distance == 0 {
            return 0;
        }
        self.dice_table()
            .get(distance as usize - 1)
            .copied()
            .unwrap_or(0)
    }

    /// The die face that scores a hit against this unit type
    pub fn symbol(self) -> DieFace {
        match self {
            UnitKind::Infantry => DieFace::Infantry,
            UnitKind::Armor => DieFace::Armor,
        }
    }

    fn dice_table(self) -> &'static [u8; 3] {
        match self {
            UnitKind::Infantry => &INFANTRY_DICE,
            UnitKind::Armor => &ARMOR_DICE,
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKind::Infantry => f.write_str("infantry"),
            UnitKind::Armor => f.write_str("armor"),
        }
    }
}

/// Unit identifier, unique within a game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// Immutable unit identity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub side: Side,
    pub kind: UnitKind,
    pub starting_strength: u8,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} #{}", self.side, self.kind, self.id.0)
    }
}

/// Mutable per-unit battle state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitState {
    pub strength: u8,
    pub ordered: bool,
    pub moved: bool,
    pub skips_battle: bool,
    pub battles_this_turn: u8,
    /// Selection ordinal while chosen as a card target
    pub targeted: Option<u32>,
}

impl UnitState {
    pub fn new(strength: u8) -> Self {
        Self {
            strength,
            ordered: false,
            moved: false,
            skips_battle: false,
            battles_this_turn: 0,
            targeted: None,
        }
    }

    pub fn is_targeted(&self) -> bool {
        self.targeted.is_some()
    }

    /// Clear everything that only lasts for one turn
    pub fn reset_turn(&mut self) {
        self.ordered = false;
        self.moved = false;
        self.skips_battle = false;
        self.battles_this_turn = 0;
        self.targeted = None;
    }
}
