//! FRONTLINE Core - Rules engine for hex-grid battles
//!
//! This crate provides the rules of a card-driven tactical wargame:
//! - Board geometry (offset-row hex grid with axial coordinates)
//! - Battle dice, terrain and fortifications
//! - Command cards, the phase stack and move generation
//! - Combat, retreats, taking ground and armor overruns
//! - Scenario files

pub mod analysis;
pub mod board;
pub mod cards;
pub mod combat;
pub mod dice;
pub mod error;
pub mod events;
pub mod game;
pub mod moves;
pub mod phase;
pub mod scenario;
pub mod tasks;
pub mod terrain;
pub mod units;

// Re-exports for convenient access
pub use analysis::expected_hits;
pub use board::{Baseline, Direction, Flank, HexCoord, BOARD_COLUMNS, BOARD_ROWS};
pub use cards::{Card, Deck};
pub use dice::{DiceSource, DieFace, RandomDice, ScriptedDice, SharedDice};
pub use error::{Result, RulesError};
pub use events::Event;
pub use game::{GameConfig, GameResult, GameState};
pub use moves::Move;
pub use phase::{Phase, PhaseKind};
pub use scenario::Scenario;
pub use tasks::{DeferredTask, TaskStatus};
pub use terrain::{Fortification, Terrain};
pub use units::{Side, Unit, UnitId, UnitKind, UnitState};
