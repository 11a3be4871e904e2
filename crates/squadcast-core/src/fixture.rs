// Fixtures and teams.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::player::TeamId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: u32,
    /// Scheduled gameweek; `None` for postponed or unscheduled matches.
    pub gameweek: Option<u32>,
    pub home_team: TeamId,
    pub away_team: TeamId,
    /// Difficulty (1-5) faced by the home side.
    pub home_difficulty: u8,
    /// Difficulty (1-5) faced by the away side.
    pub away_difficulty: u8,
    pub finished: bool,
    pub kickoff: Option<DateTime<Utc>>,
}

/// One fixture seen from a single team's perspective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamFixture {
    pub fixture_id: u32,
    pub gameweek: Option<u32>,
    pub opponent: TeamId,
    pub is_home: bool,
    pub difficulty: u8,
}

impl Fixture {
    pub fn involves(&self, team: TeamId) -> bool {
        self.home_team == team || self.away_team == team
    }

    /// View the fixture from `team`'s side, if it plays in it.
    pub fn for_team(&self, team: TeamId) -> Option<TeamFixture> {
        if self.home_team == team {
            Some(TeamFixture {
                fixture_id: self.id,
                gameweek: self.gameweek,
                opponent: self.away_team,
                is_home: true,
                difficulty: self.home_difficulty,
            })
        } else if self.away_team == team {
            Some(TeamFixture {
                fixture_id: self.id,
                gameweek: self.gameweek,
                opponent: self.home_team,
                is_home: false,
                difficulty: self.away_difficulty,
            })
        } else {
            None
        }
    }
}

/// The next `limit` unfinished fixtures for `team`, ordered by gameweek with
/// unscheduled fixtures last.
pub fn upcoming_for_team(fixtures: &[Fixture], team: TeamId, limit: usize) -> Vec<TeamFixture> {
    let mut upcoming: Vec<TeamFixture> = fixtures
        .iter()
        .filter(|f| !f.finished)
        .filter_map(|f| f.for_team(team))
        .collect();
    upcoming.sort_by_key(|f| (f.gameweek.unwrap_or(u32::MAX), f.fixture_id));
    upcoming.truncate(limit);
    upcoming
}

/// All of `team`'s fixtures in `gameweek`. More than one means a double
/// gameweek, none means a blank.
pub fn fixtures_in_gameweek(fixtures: &[Fixture], team: TeamId, gameweek: u32) -> Vec<TeamFixture> {
    fixtures
        .iter()
        .filter(|f| f.gameweek == Some(gameweek))
        .filter_map(|f| f.for_team(team))
        .collect()
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub short_name: String,
    pub strength_overall_home: u32,
    pub strength_overall_away: u32,
}

impl Team {
    pub fn mean_strength(&self) -> f64 {
        f64::from(self.strength_overall_home + self.strength_overall_away) / 2.0
    }
}

/// Team ids ordered strongest first (ties broken by id).
pub fn rank_by_strength(teams: &[Team]) -> Vec<TeamId> {
    let mut ranked: Vec<&Team> = teams.iter().collect();
    ranked.sort_by(|a, b| {
        b.mean_strength()
            .partial_cmp(&a.mean_strength())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.id.cmp(&b.id))
    });
    ranked.into_iter().map(|t| t.id).collect()
}
