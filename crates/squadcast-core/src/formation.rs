// Starting-eleven formations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::player::Position;

/// Outfield shape of a starting eleven. The goalkeeper count is always one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Formation {
    pub defenders: usize,
    pub midfielders: usize,
    pub forwards: usize,
}

/// Every formation the game accepts, in preference order for tie-breaks.
pub const VALID_FORMATIONS: [Formation; 8] = [
    Formation::new(3, 4, 3),
    Formation::new(3, 5, 2),
    Formation::new(4, 3, 3),
    Formation::new(4, 4, 2),
    Formation::new(4, 5, 1),
    Formation::new(5, 3, 2),
    Formation::new(5, 4, 1),
    Formation::new(5, 2, 3),
];

impl Formation {
    pub const fn new(defenders: usize, midfielders: usize, forwards: usize) -> Self {
        Self {
            defenders,
            midfielders,
            forwards,
        }
    }

    /// Number of starters required at `position`.
    pub fn slots(&self, position: Position) -> usize {
        match position {
            Position::Goalkeeper => 1,
            Position::Defender => self.defenders,
            Position::Midfielder => self.midfielders,
            Position::Forward => self.forwards,
        }
    }

    pub fn is_valid(&self) -> bool {
        VALID_FORMATIONS.contains(self)
    }
}

impl Default for Formation {
    fn default() -> Self {
        Formation::new(4, 4, 2)
    }
}

impl fmt::Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.defenders, self.midfielders, self.forwards)
    }
}
