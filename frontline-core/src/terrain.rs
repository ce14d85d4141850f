//! Terrain and fortification maps
//!
//! Both maps are sparse: a hex with no entry is [`Terrain::Clear`] or
//! [`Fortification::None`].

use crate::board::HexCoord;
use crate::error::{Result, RulesError};
use crate::units::UnitKind;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Terrain type of a hex
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    #[default]
    Clear,
    Forest,
    Hills,
    Town,
    River,
}

impl Terrain {
    pub fn blocks_line_of_sight(self) -> bool {
        matches!(self, Terrain::Forest | Terrain::Hills | Terrain::Town)
    }

    pub fn is_impassable(self) -> bool {
        self == Terrain::River
    }

    /// Entering ends the unit's movement and forfeits its battle this turn
    pub fn stops_movement(self) -> bool {
        matches!(self, Terrain::Forest | Terrain::Town)
    }

    /// Dice removed from an attack against a unit on this terrain
    pub fn dice_reduction(self, attacker: UnitKind) -> u8 {
        match (self, attacker) {
            (Terrain::Forest | Terrain::Town, UnitKind::Infantry) => 1,
            (Terrain::Forest | Terrain::Town, UnitKind::Armor) => 2,
            (Terrain::Hills, _) => 1,
            _ => 0,
        }
    }
}

/// Fortification placed on a hex
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fortification {
    #[default]
    None,
    Sandbag,
}

impl Fortification {
    pub fn dice_reduction(self) -> u8 {
        match self {
            Fortification::None => 0,
            Fortification::Sandbag => 1,
        }
    }

    /// Flags the defender may choose to disregard
    pub fn ignorable_flags(self) -> u8 {
        match self {
            Fortification::None => 0,
            Fortification::Sandbag => 1,
        }
    }
}

// ============================================================================
// MAPS
// ============================================================================

/// Terrain by hex; read-only once frozen
#[derive(Clone, Debug, Default)]
pub struct TerrainMap {
    cells: FxHashMap<HexCoord, Terrain>,
    frozen: bool,
}

impl TerrainMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, hex: HexCoord) -> Terrain {
        self.cells.get(&hex).copied().unwrap_or_default()
    }

    pub fn set(&mut self, hex: HexCoord, terrain: Terrain) -> Result<()> {
        if self.frozen {
            return Err(RulesError::TerrainFrozen(hex));
        }
        if terrain == Terrain::Clear {
            self.cells.remove(&hex);
        } else {
            self.cells.insert(hex, terrain);
        }
        Ok(())
    }

    /// Finish setup; every later `set` fails
    pub fn freeze(&mut self) {
        self.frozen = true;
    }
}

/// Fortifications by hex
#[derive(Clone, Debug, Default)]
pub struct FortificationMap {
    cells: FxHashMap<HexCoord, Fortification>,
}

impl FortificationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, hex: HexCoord) -> Fortification {
        self.cells.get(&hex).copied().unwrap_or_default()
    }

    pub fn set(&mut self, hex: HexCoord, fortification: Fortification) {
        if fortification == Fortification::None {
            self.cells.remove(&hex);
        } else {
            self.cells.insert(hex, fortification);
        }
    }

    /// Remove whatever stands on `hex`, returning it
    pub fn remove(&mut self, hex: HexCoord) -> Fortification {
        self.cells.remove(&hex).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let terrain = TerrainMap::new();
        let forts = FortificationMap::new();
        assert_eq!(terrain.get(HexCoord::new(3, 3)), Terrain::Clear);
        assert_eq!(forts.get(HexCoord::new(3, 3)), Fortification::None);
    }

    #[test]
    fn test_frozen_terrain_rejects_changes() {
        let mut terrain = TerrainMap::new();
        let hex = HexCoord::new(2, 2);
        terrain.set(hex, Terrain::Forest).unwrap();
        terrain.freeze();
        assert_eq!(terrain.set(hex, Terrain::Town), Err(RulesError::TerrainFrozen(hex)));
        assert_eq!(terrain.get(hex), Terrain::Forest);
    }

    #[test]
    fn test_fortification_removal() {
        let mut forts = FortificationMap::new();
        let hex = HexCoord::new(1, 4);
        forts.set(hex, Fortification::Sandbag);
        assert_eq!(forts.remove(hex), Fortification::Sandbag);
        assert_eq!(forts.get(hex), Fortification::None);
        assert_eq!(forts.remove(hex), Fortification::None);
    }

    #[test]
    fn test_dice_reduction() {
        assert_eq!(Terrain::Forest.dice_reduction(UnitKind::Infantry), 1);
        assert_eq!(Terrain::Town.dice_reduction(UnitKind::Armor), 2);
        assert_eq!(Terrain::Hills.dice_reduction(UnitKind::Armor), 1);
        assert_eq!(Terrain::Clear.dice_reduction(UnitKind::Armor), 0);
    }
}
