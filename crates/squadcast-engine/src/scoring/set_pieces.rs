// Set-piece taker table and the set-piece sub-score.
//
// Duties change every season, so the table is data (a versioned TOML file)
// rather than code.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use squadcast_core::{Player, PlayerHistory, Position};

use super::clamp_score;

#[derive(Debug, Error)]
pub enum SetPieceError {
    #[error("failed to read set-piece table {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse set-piece table {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DutyTiers {
    pub primary: HashSet<String>,
    pub secondary: HashSet<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CornerTakers {
    pub takers: HashSet<String>,
}

/// Named set-piece takers for one season.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SetPieceTable {
    pub season: String,
    pub penalties: DutyTiers,
    pub free_kicks: DutyTiers,
    pub corners: CornerTakers,
}

impl SetPieceTable {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, SetPieceError> {
        toml::from_str(text).map_err(|source| SetPieceError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, SetPieceError> {
        let text = std::fs::read_to_string(path).map_err(|source| SetPieceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    pub fn is_primary_penalty_taker(&self, name: &str) -> bool {
        self.penalties.primary.contains(name)
    }

    /// Raw duty points before the penalty record and position adjustments.
    fn duty_points(&self, name: &str) -> f64 {
        let mut points = 0.0;
        if self.penalties.primary.contains(name) {
            points += 20.0;
        } else if self.penalties.secondary.contains(name) {
            points += 10.0;
        }
        if self.free_kicks.primary.contains(name) {
            points += 10.0;
        } else if self.free_kicks.secondary.contains(name) {
            points += 5.0;
        }
        if self.corners.takers.contains(name) {
            points += 3.0;
        }
        points
    }
}

/// Set-piece sub-score in [0, 100].
pub fn set_piece_score(
    player: &Player,
    history: Option<&PlayerHistory>,
    table: &SetPieceTable,
) -> f64 {
    if player.position() == Position::Goalkeeper {
        return 0.0;
    }

    let mut points = table.duty_points(&player.name);

    let taken_last_season = history
        .and_then(|h| h.latest())
        .map_or(0, |s| s.penalties_scored + s.penalties_missed);
    if taken_last_season >= 5 {
        points = points.max(25.0);
    } else if taken_last_season >= 2 {
        points = points.max(15.0);
    }

    match player.position() {
        Position::Defender if points > 0.0 => points *= 1.2,
        Position::Forward if table.is_primary_penalty_taker(&player.name) => points *= 1.3,
        _ => {}
    }

    clamp_score(points * 4.0)
}
