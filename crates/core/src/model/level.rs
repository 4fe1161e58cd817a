use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::LevelId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DifficultyError {
    #[error("difficulty must be between {min} and {max}, got {got}", min = Difficulty::MIN, max = Difficulty::MAX)]
    OutOfRange { got: i64 },
}

/// Star rating used to filter questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// # Errors
    ///
    /// Returns `DifficultyError::OutOfRange` outside `1..=5`.
    pub fn new(value: i64) -> Result<Self, DifficultyError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(DifficultyError::OutOfRange { got: value })
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Filled and empty stars, e.g. `★★☆☆☆` for 2.
    #[must_use]
    pub fn stars(&self) -> String {
        (Self::MIN..=Self::MAX)
            .map(|n| if n <= self.0 { '★' } else { '☆' })
            .collect()
    }
}

impl TryFrom<i64> for Difficulty {
    type Error = DifficultyError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Difficulty> for i64 {
    fn from(d: Difficulty) -> Self {
        i64::from(d.0)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A selectable level on the level screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    pub id: LevelId,
    pub difficulty: Difficulty,
}

impl Level {
    /// Levels offered out of the box.
    #[must_use]
    pub fn catalog() -> Vec<Level> {
        [(1, 2), (2, 1), (3, 3)]
            .into_iter()
            .map(|(id, difficulty)| Level {
                id: LevelId::new(id),
                difficulty: Difficulty(difficulty),
            })
            .collect()
    }

    /// Looks up a level in the default catalog.
    #[must_use]
    pub fn find(id: LevelId) -> Option<Level> {
        Self::catalog().into_iter().find(|lvl| lvl.id == id)
    }

    /// Navigation request for starting this level.
    #[must_use]
    pub fn launch(&self, muted: bool) -> GameLaunch {
        GameLaunch {
            level: self.id,
            difficulty: self.difficulty,
            muted,
        }
    }
}

/// Parameters carried from the level screen into a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLaunch {
    pub level: LevelId,
    pub difficulty: Difficulty,
    #[serde(default = "default_muted")]
    pub muted: bool,
}

fn default_muted() -> bool {
    true
}
