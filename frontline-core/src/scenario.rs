//! Scenario - starting position and game parameters
//!
//! Hexes are written as offset `column`/`row` pairs, the way a printed
//! battle map labels them.

use crate::board::HexCoord;
use crate::dice::SharedDice;
use crate::error::{Result, RulesError};
use crate::game::{GameConfig, GameState, DEFAULT_MEDALS_TO_WIN};
use crate::terrain::{Fortification, Terrain};
use crate::units::{Side, UnitKind};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandSizes {
    pub allies: usize,
    pub axis: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainPlacement {
    pub column: i16,
    pub row: i16,
    pub terrain: Terrain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FortificationPlacement {
    pub column: i16,
    pub row: i16,
    pub fortification: Fortification,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPlacement {
    pub side: Side,
    pub kind: UnitKind,
    pub column: i16,
    pub row: i16,
    /// Overrides the kind's default starting strength
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<u8>,
}

/// A playable battle
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub medals_to_win: usize,
    pub north_side: Side,
    pub first_side: Side,
    pub hand_sizes: HandSizes,
    pub deck_seed: u64,
    #[serde(default)]
    pub terrain: Vec<TerrainPlacement>,
    #[serde(default)]
    pub fortifications: Vec<FortificationPlacement>,
    pub units: Vec<UnitPlacement>,
}

fn on_board(column: i16, row: i16) -> Result<HexCoord> {
    let hex = HexCoord::from_offset(column, row);
    if hex.is_on_board() {
        Ok(hex)
    } else {
        Err(RulesError::OffBoard(hex))
    }
}

impl Scenario {
    /// Build the starting position: terrain (then frozen), fortifications,
    /// units and opening hands
    pub fn to_game_state(&self, dice: SharedDice) -> Result<GameState> {
        let config = GameConfig {
            medals_to_win: self.medals_to_win,
            north_side: self.north_side,
            first_side: self.first_side,
            deck_seed: self.deck_seed,
        };
        let mut state = GameState::new(config, dice);

        for placement in &self.terrain {
            state.set_terrain(on_board(placement.column, placement.row)?, placement.terrain)?;
        }
        state.freeze_terrain();

        for placement in &self.fortifications {
            let hex = on_board(placement.column, placement.row)?;
            state.set_fortification(hex, placement.fortification);
        }
        for placement in &self.units {
            let hex = on_board(placement.column, placement.row)?;
            state.place_unit(placement.side, placement.kind, hex, placement.strength)?;
        }

        state.deal(Side::Allies, self.hand_sizes.allies);
        state.deal(Side::Axis, self.hand_sizes.axis);
        Ok(state)
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("parsing scenario {}", path.display()))
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("writing scenario {}", path.display()))?;
        Ok(())
    }
}

impl Default for Scenario {
    /// A small meeting engagement across a wooded ridge
    fn default() -> Self {
        use Side::*;
        use UnitKind::*;

        let unit = |side, kind, column, row| UnitPlacement {
            side,
            kind,
            column,
            row,
            strength: None,
        };
        let terrain = |column, row, terrain| TerrainPlacement { column, row, terrain };

        Self {
            name: "skirmish".to_string(),
            medals_to_win: DEFAULT_MEDALS_TO_WIN,
            north_side: Axis,
            first_side: Allies,
            hand_sizes: HandSizes { allies: 5, axis: 4 },
            deck_seed: 1944,
            terrain: vec![
                terrain(3, 4, Terrain::Forest),
                terrain(4, 4, Terrain::Forest),
                terrain(6, 3, Terrain::Hills),
                terrain(7, 3, Terrain::Hills),
                terrain(9, 5, Terrain::Town),
                terrain(0, 4, Terrain::River),
                terrain(1, 4, Terrain::River),
                terrain(11, 4, Terrain::Forest),
            ],
            fortifications: vec![
                FortificationPlacement {
                    column: 5,
                    row: 1,
                    fortification: Fortification::Sandbag,
                },
                FortificationPlacement {
                    column: 8,
                    row: 1,
                    fortification: Fortification::Sandbag,
                },
            ],
            units: vec![
                unit(Axis, Infantry, 2, 1),
                unit(Axis, Infantry, 5, 1),
                unit(Axis, Infantry, 8, 1),
                unit(Axis, Infantry, 11, 1),
                unit(Axis, Infantry, 6, 2),
                unit(Axis, Armor, 4, 0),
                unit(Axis, Armor, 9, 0),
                unit(Allies, Infantry, 2, 7),
                unit(Allies, Infantry, 5, 7),
                unit(Allies, Infantry, 8, 7),
                unit(Allies, Infantry, 10, 7),
                unit(Allies, Infantry, 6, 6),
                unit(Allies, Armor, 3, 8),
                unit(Allies, Armor, 7, 8),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario_builds() {
        let scenario = Scenario::default();
        let state = scenario.to_game_state(SharedDice::seeded(1)).unwrap();
        assert_eq!(state.units().count(), scenario.units.len());
        assert_eq!(state.hand(Side::Allies).len(), 5);
        assert_eq!(state.hand(Side::Axis).len(), 4);
        assert_eq!(state.terrain_at(HexCoord::from_offset(9, 5)), Terrain::Town);
        assert_eq!(
            state.fortification_at(HexCoord::from_offset(5, 1)),
            Fortification::Sandbag
        );
        assert!(!state.legal_moves().is_empty());
    }

    #[test]
    fn test_terrain_frozen_after_setup() {
        let mut state = Scenario::default().to_game_state(SharedDice::seeded(1)).unwrap();
        let hex = HexCoord::from_offset(0, 0);
        assert_eq!(
            state.set_terrain(hex, Terrain::Forest),
            Err(RulesError::TerrainFrozen(hex))
        );
    }

    #[test]
    fn test_off_board_placement_rejected() {
        let mut scenario = Scenario::default();
        scenario.units.push(UnitPlacement {
            side: Side::Allies,
            kind: UnitKind::Armor,
            column: 12,
            row: 3,
            strength: None,
        });
        let err = scenario.to_game_state(SharedDice::seeded(1)).unwrap_err();
        assert_eq!(err, RulesError::OffBoard(HexCoord::from_offset(12, 3)));
    }

    #[test]
    fn test_zero_strength_placement_rejected() {
        let mut scenario = Scenario::default();
        scenario.units[0].strength = Some(0);
        let placed = &scenario.units[0];
        let hex = HexCoord::from_offset(placed.column, placed.row);
        let err = scenario.to_game_state(SharedDice::seeded(1)).unwrap_err();
        assert_eq!(err, RulesError::ZeroStrength(hex));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("frontline-scenario-{}.json", std::process::id()));
        let mut scenario = Scenario::default();
        scenario.units[0].strength = Some(2);
        scenario.save(&path).unwrap();
        let loaded = Scenario::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, scenario);
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = Scenario::load(Path::new("/nonexistent/frontline.json")).unwrap_err();
        assert!(err.to_string().contains("reading scenario"));
    }
}
