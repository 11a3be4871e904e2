// Player model: identity, position, price, season statistics and availability.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::price::Price;

pub type PlayerId = u32;
pub type TeamId = u32;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Map the game API's `element_type` code (1-4).
    pub fn from_element_type(code: u8) -> Option<Position> {
        match code {
            1 => Some(Position::Goalkeeper),
            2 => Some(Position::Defender),
            3 => Some(Position::Midfielder),
            4 => Some(Position::Forward),
            _ => None,
        }
    }

    /// How many players of this position a full squad carries.
    pub fn squad_quota(self) -> usize {
        match self {
            Position::Goalkeeper => 2,
            Position::Defender => 5,
            Position::Midfielder => 5,
            Position::Forward => 3,
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }

    pub fn is_outfield(self) -> bool {
        self != Position::Goalkeeper
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_label())
    }
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    Available,
    Doubtful,
    Unavailable,
}

impl Availability {
    /// Interpret the API status code together with the chance-of-playing
    /// percentage. An "available" player with a reduced chance is doubtful.
    pub fn from_status(status: &str, chance_of_playing: Option<u8>) -> Availability {
        match status {
            "a" => match chance_of_playing {
                Some(c) if c < 100 => Availability::Doubtful,
                _ => Availability::Available,
            },
            "d" => Availability::Doubtful,
            _ => Availability::Unavailable,
        }
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Cumulative statistics for the current season.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonStats {
    pub total_points: i32,
    pub minutes: u32,
    pub goals_scored: u32,
    pub assists: u32,
    pub clean_sheets: u32,
    pub goals_conceded: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
    pub saves: u32,
    pub bonus: u32,
    pub bps: i32,
}

/// Underlying expected statistics. Zero when the source has none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectedStats {
    pub goals: f64,
    pub assists: f64,
    pub goal_involvements: f64,
    pub goals_conceded: f64,
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A selectable player. Identity, position and price are fixed at
/// construction; everything else is observable data.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    id: PlayerId,
    position: Position,
    price: Price,
    pub name: String,
    pub full_name: String,
    pub team: TeamId,
    pub stats: SeasonStats,
    pub expected: ExpectedStats,
    pub form: f64,
    pub points_per_game: f64,
    /// Percentage of managers owning the player (0-100).
    pub ownership: f64,
    pub availability: Availability,
    pub chance_of_playing: Option<u8>,
    pub transfers_in_event: i64,
    pub transfers_out_event: i64,
    /// Price change since the season started, in tenths.
    pub cost_change_start: i32,
    pub news: String,
}

impl Player {
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        team: TeamId,
        position: Position,
        price: Price,
    ) -> Self {
        let name = name.into();
        Self {
            id,
            position,
            price,
            full_name: name.clone(),
            name,
            team,
            stats: SeasonStats::default(),
            expected: ExpectedStats::default(),
            form: 0.0,
            points_per_game: 0.0,
            ownership: 0.0,
            availability: Availability::Available,
            chance_of_playing: None,
            transfers_in_event: 0,
            transfers_out_event: 0,
            cost_change_start: 0,
            news: String::new(),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn price(&self) -> Price {
        self.price
    }

    /// True when nothing suggests the player will miss the next match.
    pub fn is_fully_fit(&self) -> bool {
        self.availability == Availability::Available
            && self.chance_of_playing.map_or(true, |c| c >= 100)
    }

    /// Chance of playing as a fraction, taking the status into account.
    pub fn playing_probability(&self) -> f64 {
        match self.availability {
            Availability::Unavailable => 0.0,
            _ => f64::from(self.chance_of_playing.unwrap_or(100).min(100)) / 100.0,
        }
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Summary of one completed season.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    /// Season label such as "2024/25".
    pub season: String,
    pub total_points: i32,
    pub minutes: u32,
    pub penalties_scored: u32,
    pub penalties_missed: u32,
}

/// Past seasons for one player, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerHistory {
    pub seasons: Vec<SeasonSummary>,
}

impl PlayerHistory {
    pub fn new(mut seasons: Vec<SeasonSummary>) -> Self {
        seasons.sort_by(|a, b| a.season.cmp(&b.season));
        Self { seasons }
    }

    /// Up to `n` most recent seasons, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &SeasonSummary> {
        self.seasons.iter().rev().take(n)
    }

    pub fn latest(&self) -> Option<&SeasonSummary> {
        self.seasons.last()
    }

    pub fn contains_season(&self, label: &str) -> bool {
        self.seasons.iter().any(|s| s.season == label)
    }

    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }
}
