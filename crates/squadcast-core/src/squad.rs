// The 15-player squad and its structural invariants.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::formation::Formation;
use crate::player::{Player, PlayerId, Position, TeamId};
use crate::price::Price;

pub const SQUAD_SIZE: usize = 15;
pub const MAX_PER_TEAM: usize = 3;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SquadError {
    #[error("squad must have {expected} players, got {actual}")]
    WrongSize { expected: usize, actual: usize },

    #[error("squad needs {expected} {position} players, got {actual}")]
    PositionCount {
        position: Position,
        expected: usize,
        actual: usize,
    },

    #[error("team {team} has {count} players (max {MAX_PER_TEAM})")]
    TeamLimit { team: TeamId, count: usize },

    #[error("player {id} appears more than once")]
    DuplicatePlayer { id: PlayerId },

    #[error("player {id} is not in the squad")]
    NotInSquad { id: PlayerId },

    #[error("cannot swap a {outgoing} for a {incoming}")]
    PositionMismatch { outgoing: Position, incoming: Position },

    #[error("swap exceeds budget by {shortfall:.1}m")]
    OverBudget { shortfall: f64 },

    #[error("formation {0} is not allowed")]
    InvalidFormation(Formation),
}

// ---------------------------------------------------------------------------
// Squad
// ---------------------------------------------------------------------------

/// A complete squad. Size, positional quotas, team caps and uniqueness are
/// checked on construction and preserved by `swap`.
#[derive(Debug, Clone, PartialEq)]
pub struct Squad {
    players: Vec<Player>,
    formation: Formation,
    budget: Price,
}

impl Squad {
    /// Build a squad. The budget is recorded but not enforced here, since
    /// rosters loaded from elsewhere may already be over it.
    pub fn new(players: Vec<Player>, budget: Price) -> Result<Self, SquadError> {
        validate_structure(&players)?;
        Ok(Self {
            players,
            formation: Formation::default(),
            budget,
        })
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn into_players(self) -> Vec<Player> {
        self.players
    }

    pub fn formation(&self) -> Formation {
        self.formation
    }

    pub fn set_formation(&mut self, formation: Formation) -> Result<(), SquadError> {
        if !formation.is_valid() {
            return Err(SquadError::InvalidFormation(formation));
        }
        self.formation = formation;
        Ok(())
    }

    pub fn budget(&self) -> Price {
        self.budget
    }

    pub fn spent(&self) -> Price {
        self.players.iter().map(|p| p.price()).sum()
    }

    /// Budget minus spend in millions. Negative for an over-budget roster.
    pub fn remaining_budget(&self) -> f64 {
        self.budget.diff_millions(self.spent())
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id() == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id()).collect()
    }

    pub fn by_position(&self, position: Position) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(move |p| p.position() == position)
    }

    pub fn team_count(&self, team: TeamId) -> usize {
        self.players.iter().filter(|p| p.team == team).count()
    }

    /// Replace `outgoing` with `incoming`, returning the player removed.
    /// Positions must match, the team cap must hold and the new total must
    /// fit the budget.
    pub fn swap(&mut self, outgoing: PlayerId, incoming: Player) -> Result<Player, SquadError> {
        let idx = self
            .players
            .iter()
            .position(|p| p.id() == outgoing)
            .ok_or(SquadError::NotInSquad { id: outgoing })?;

        let current = &self.players[idx];
        if current.position() != incoming.position() {
            return Err(SquadError::PositionMismatch {
                outgoing: current.position(),
                incoming: incoming.position(),
            });
        }
        if self.contains(incoming.id()) {
            return Err(SquadError::DuplicatePlayer { id: incoming.id() });
        }

        let same_team = self
            .players
            .iter()
            .filter(|p| p.id() != outgoing && p.team == incoming.team)
            .count();
        if same_team + 1 > MAX_PER_TEAM {
            return Err(SquadError::TeamLimit {
                team: incoming.team,
                count: same_team + 1,
            });
        }

        let new_spent = self.spent().saturating_sub(current.price()) + incoming.price();
        if new_spent > self.budget {
            return Err(SquadError::OverBudget {
                shortfall: new_spent.diff_millions(self.budget),
            });
        }

        Ok(std::mem::replace(&mut self.players[idx], incoming))
    }
}

/// Check size, quotas, team caps and duplicate ids.
pub fn validate_structure(players: &[Player]) -> Result<(), SquadError> {
    if players.len() != SQUAD_SIZE {
        return Err(SquadError::WrongSize {
            expected: SQUAD_SIZE,
            actual: players.len(),
        });
    }

    let mut seen = HashSet::new();
    for p in players {
        if !seen.insert(p.id()) {
            return Err(SquadError::DuplicatePlayer { id: p.id() });
        }
    }

    for position in Position::ALL {
        let actual = players.iter().filter(|p| p.position() == position).count();
        if actual != position.squad_quota() {
            return Err(SquadError::PositionCount {
                position,
                expected: position.squad_quota(),
                actual,
            });
        }
    }

    let mut per_team: HashMap<TeamId, usize> = HashMap::new();
    for p in players {
        *per_team.entry(p.team).or_insert(0) += 1;
    }
    let mut teams: Vec<(TeamId, usize)> = per_team.into_iter().collect();
    teams.sort();
    if let Some((team, count)) = teams.into_iter().find(|&(_, c)| c > MAX_PER_TEAM) {
        return Err(SquadError::TeamLimit { team, count });
    }

    Ok(())
}
