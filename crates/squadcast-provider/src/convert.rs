// Record → domain model conversion.
//
// Records that cannot become a valid model value (unknown position code,
// negative price, missing id) are rejected individually; the batch helpers
// log and skip them so one bad row never fails a run.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

use squadcast_core::{
    Availability, Fixture, Player, PlayerHistory, Position, Price, SeasonSummary, Team,
};
use squadcast_core::player::{ExpectedStats, SeasonStats};

use crate::records::{FixtureRecord, HistoryRecord, PlayerRecord, TeamRecord};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("record has no usable id ({0})")]
    InvalidId(i64),

    #[error("player {id} has unknown position code {code}")]
    UnknownPosition { id: i64, code: i64 },

    #[error("player {id} has negative price {price}")]
    NegativePrice { id: i64, price: i64 },

    #[error("player {id} has no team")]
    MissingTeam { id: i64 },
}

fn id(value: i64) -> Result<u32, RecordError> {
    u32::try_from(value)
        .ok()
        .filter(|&v| v > 0)
        .ok_or(RecordError::InvalidId(value))
}

/// Counts below zero are treated as zero.
fn count(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn signed(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

fn difficulty(value: i64) -> u8 {
    value.clamp(1, 5) as u8
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

pub fn player_from_record(record: &PlayerRecord) -> Result<Player, RecordError> {
    let player_id = id(record.id)?;
    let position = u8::try_from(record.element_type)
        .ok()
        .and_then(Position::from_element_type)
        .ok_or(RecordError::UnknownPosition {
            id: record.id,
            code: record.element_type,
        })?;
    if record.now_cost < 0 {
        return Err(RecordError::NegativePrice {
            id: record.id,
            price: record.now_cost,
        });
    }
    let team = id(record.team).map_err(|_| RecordError::MissingTeam { id: record.id })?;
    let price = Price::from_tenths(count(record.now_cost));

    let name = if record.web_name.is_empty() {
        record.second_name.clone()
    } else {
        record.web_name.clone()
    };
    let mut player = Player::new(player_id, name, team, position, price);

    let full_name = format!("{} {}", record.first_name, record.second_name);
    if !full_name.trim().is_empty() {
        player.full_name = full_name.trim().to_string();
    }

    player.stats = SeasonStats {
        total_points: signed(record.total_points),
        minutes: count(record.minutes),
        goals_scored: count(record.goals_scored),
        assists: count(record.assists),
        clean_sheets: count(record.clean_sheets),
        goals_conceded: count(record.goals_conceded),
        yellow_cards: count(record.yellow_cards),
        red_cards: count(record.red_cards),
        saves: count(record.saves),
        bonus: count(record.bonus),
        bps: signed(record.bps),
    };
    player.expected = ExpectedStats {
        goals: record.expected_goals.max(0.0),
        assists: record.expected_assists.max(0.0),
        goal_involvements: record.expected_goal_involvements.max(0.0),
        goals_conceded: record.expected_goals_conceded.max(0.0),
    };
    player.form = record.form;
    player.points_per_game = record.points_per_game;
    player.ownership = record.selected_by_percent.clamp(0.0, 100.0);
    player.chance_of_playing = record
        .chance_of_playing_next_round
        .map(|c| c.clamp(0, 100) as u8);
    player.availability = Availability::from_status(&record.status, player.chance_of_playing);
    player.transfers_in_event = record.transfers_in_event;
    player.transfers_out_event = record.transfers_out_event;
    player.cost_change_start = signed(record.cost_change_start);
    player.news = record.news.clone();

    Ok(player)
}

/// Convert every valid player record, logging and skipping the rest.
pub fn convert_players(records: &[PlayerRecord]) -> Vec<Player> {
    records
        .iter()
        .filter_map(|record| match player_from_record(record) {
            Ok(player) => Some(player),
            Err(e) => {
                warn!("skipping player record: {e}");
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Teams and fixtures
// ---------------------------------------------------------------------------

pub fn team_from_record(record: &TeamRecord) -> Result<Team, RecordError> {
    Ok(Team {
        id: id(record.id)?,
        name: record.name.clone(),
        short_name: record.short_name.clone(),
        strength_overall_home: count(record.strength_overall_home),
        strength_overall_away: count(record.strength_overall_away),
    })
}

pub fn convert_teams(records: &[TeamRecord]) -> Vec<Team> {
    records
        .iter()
        .filter_map(|record| match team_from_record(record) {
            Ok(team) => Some(team),
            Err(e) => {
                warn!("skipping team record: {e}");
                None
            }
        })
        .collect()
}

pub fn fixture_from_record(record: &FixtureRecord) -> Result<Fixture, RecordError> {
    let kickoff = record.kickoff_time.as_deref().and_then(|text| {
        DateTime::parse_from_rfc3339(text)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| warn!(fixture = record.id, "unparseable kickoff time {text:?}: {e}"))
            .ok()
    });

    Ok(Fixture {
        id: id(record.id)?,
        gameweek: record.event.and_then(|gw| u32::try_from(gw).ok()).filter(|&gw| gw > 0),
        home_team: id(record.team_h)?,
        away_team: id(record.team_a)?,
        home_difficulty: difficulty(record.team_h_difficulty),
        away_difficulty: difficulty(record.team_a_difficulty),
        finished: record.finished,
        kickoff,
    })
}

pub fn convert_fixtures(records: &[FixtureRecord]) -> Vec<Fixture> {
    records
        .iter()
        .filter_map(|record| match fixture_from_record(record) {
            Ok(fixture) => Some(fixture),
            Err(e) => {
                warn!("skipping fixture record: {e}");
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Past seasons with a label. Rows without one cannot be ordered and are
/// dropped.
pub fn history_from_record(record: &HistoryRecord) -> PlayerHistory {
    let seasons = record
        .history_past
        .iter()
        .filter(|row| !row.season_name.is_empty())
        .map(|row| SeasonSummary {
            season: row.season_name.clone(),
            total_points: signed(row.total_points),
            minutes: count(row.minutes),
            penalties_scored: count(row.penalties_scored),
            penalties_missed: count(row.penalties_missed),
        })
        .collect();
    PlayerHistory::new(seasons)
}
