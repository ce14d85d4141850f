//! Battle dice
//!
//! A battle die has six faces: two infantry, one armor, one grenade, one star
//! and one flag. Rolls are always returned sorted by [`DieFace`] order so
//! callers can count outcomes without re-sorting.

use crate::error::{Result, RulesError};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Outcome of one die, ordered by severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DieFace {
    Infantry,
    Armor,
    Grenade,
    Star,
    Flag,
}

impl DieFace {
    /// The six physical faces
    pub const FACES: [DieFace; 6] = [
        DieFace::Infantry,
        DieFace::Infantry,
        DieFace::Armor,
        DieFace::Grenade,
        DieFace::Star,
        DieFace::Flag,
    ];

    /// Map a uniform sample in `[0, 1)` to a face
    pub fn from_unit_interval(sample: f64) -> DieFace {
        let index = ((sample * 6.0) as usize).min(5);
        Self::FACES[index]
    }

    /// Probability of rolling this face
    pub fn probability(self) -> f32 {
        let count = Self::FACES.iter().filter(|&&f| f == self).count();
        count as f32 / 6.0
    }
}

impl fmt::Display for DieFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DieFace::Infantry => "infantry",
            DieFace::Armor => "armor",
            DieFace::Grenade => "grenade",
            DieFace::Star => "star",
            DieFace::Flag => "flag",
        };
        f.write_str(name)
    }
}

// ============================================================================
// DICE SOURCES
// ============================================================================

/// Anything that can roll battle dice
pub trait DiceSource {
    /// Roll `count` dice, sorted by face order
    fn roll(&mut self, count: usize) -> Result<Vec<DieFace>>;
}

/// Dice driven by a uniform random number generator
#[derive(Clone, Debug)]
pub struct RandomDice<R> {
    rng: R,
}

impl<R: RngCore> RandomDice<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomDice<ChaCha8Rng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: RngCore> DiceSource for RandomDice<R> {
    fn roll(&mut self, count: usize) -> Result<Vec<DieFace>> {
        let mut faces: Vec<DieFace> = (0..count)
            .map(|_| DieFace::from_unit_interval(self.rng.gen::<f64>()))
            .collect();
        faces.sort();
        Ok(faces)
    }
}

/// Pre-supplied dice results, consumed front to back
#[derive(Clone, Debug, Default)]
pub struct ScriptedDice {
    script: VecDeque<DieFace>,
}

impl ScriptedDice {
    pub fn new(faces: impl IntoIterator<Item = DieFace>) -> Self {
        Self {
            script: faces.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl DiceSource for ScriptedDice {
    fn roll(&mut self, count: usize) -> Result<Vec<DieFace>> {
        if count > self.script.len() {
            return Err(RulesError::InsufficientScriptedResults {
                requested: count,
                remaining: self.script.len(),
            });
        }
        let mut faces: Vec<DieFace> = self.script.drain(..count).collect();
        faces.sort();
        Ok(faces)
    }
}

// ============================================================================
// SINGLE DIE
// ============================================================================

/// A die that may not have been rolled yet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Die {
    face: Option<DieFace>,
}

impl Die {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roll(&mut self, dice: &SharedDice) -> Result<DieFace> {
        let face = dice.roll(1)?[0];
        self.face = Some(face);
        Ok(face)
    }

    pub fn outcome(&self) -> Result<DieFace> {
        self.face.ok_or(RulesError::DieNotRolled)
    }
}

// ============================================================================
// SHARED HANDLE
// ============================================================================

/// Cloneable handle to one dice source.
///
/// Cloning the handle does not copy the source: every clone draws from the
/// same stream, in call order.
#[derive(Clone)]
pub struct SharedDice(Rc<RefCell<dyn DiceSource>>);

impl SharedDice {
    pub fn new<D: DiceSource + 'static>(source: D) -> Self {
        Self(Rc::new(RefCell::new(source)))
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(RandomDice::seeded(seed))
    }

    pub fn scripted(faces: impl IntoIterator<Item = DieFace>) -> Self {
        Self::new(ScriptedDice::new(faces))
    }

    pub fn roll(&self, count: usize) -> Result<Vec<DieFace>> {
        self.0.borrow_mut().roll(count)
    }

    /// True when both handles draw from the same source
    pub fn shares_source_with(&self, other: &SharedDice) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SharedDice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedDice")
            .field("handles", &Rc::strong_count(&self.0))
            .finish()
    }
}
