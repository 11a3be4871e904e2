// Loosely-typed upstream records.
//
// The stats API is inconsistent about types: decimals arrive as strings
// ("5.2"), counts occasionally as null, and fields come and go between
// seasons. Every record defaults missing keys and accepts numbers either as
// JSON numbers or numeric strings. Validation happens in `convert`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Lenient number parsing
// ---------------------------------------------------------------------------

fn number_from_value(value: Option<Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// A float from a number, a numeric string or null. Anything unusable is 0.
pub fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(number_from_value(value).unwrap_or(0.0))
}

/// An integer from a number, a numeric string or null. Fractions truncate.
pub fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(number_from_value(value).map_or(0, |v| v as i64))
}

/// Like `lenient_i64`, but null or unparseable stays `None`.
pub fn lenient_opt_i64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(number_from_value(value).map(|v| v as i64))
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One entry of the bootstrap `elements` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerRecord {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    #[serde(deserialize_with = "lenient_string")]
    pub web_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub second_name: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub team: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub element_type: i64,
    /// Price in tenths of a million.
    #[serde(deserialize_with = "lenient_i64")]
    pub now_cost: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub cost_change_start: i64,
    #[serde(deserialize_with = "lenient_string")]
    pub status: String,
    #[serde(deserialize_with = "lenient_opt_i64")]
    pub chance_of_playing_next_round: Option<i64>,
    #[serde(deserialize_with = "lenient_string")]
    pub news: String,

    #[serde(deserialize_with = "lenient_i64")]
    pub total_points: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub minutes: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub goals_scored: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub assists: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub clean_sheets: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub goals_conceded: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub yellow_cards: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub red_cards: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub saves: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub bonus: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub bps: i64,

    #[serde(deserialize_with = "lenient_f64")]
    pub form: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub points_per_game: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub selected_by_percent: f64,
    #[serde(deserialize_with = "lenient_i64")]
    pub transfers_in_event: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub transfers_out_event: i64,

    #[serde(deserialize_with = "lenient_f64")]
    pub expected_goals: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub expected_assists: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub expected_goal_involvements: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub expected_goals_conceded: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamRecord {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub short_name: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub strength_overall_home: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub strength_overall_away: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureRecord {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    /// Gameweek; null while unscheduled.
    #[serde(deserialize_with = "lenient_opt_i64")]
    pub event: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub team_h: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub team_a: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub team_h_difficulty: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub team_a_difficulty: i64,
    pub finished: bool,
    pub kickoff_time: Option<String>,
}

/// One row of `history_past` in an element summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PastSeasonRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub season_name: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub total_points: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub minutes: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub penalties_scored: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub penalties_missed: i64,
}

/// The parts of an element summary the scorer uses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryRecord {
    pub history_past: Vec<PastSeasonRecord>,
}

/// The bootstrap document: players and teams in one response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct BootstrapRecord {
    pub elements: Vec<PlayerRecord>,
    pub teams: Vec<TeamRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_strings_are_accepted() {
        let record: PlayerRecord = serde_json::from_str(
            r#"{"id": 12, "web_name": "Saka", "element_type": 3, "now_cost": 100,
                "form": "6.4", "points_per_game": "5.9", "selected_by_percent": "38.2",
                "expected_goals": "7.81", "minutes": "2450"}"#,
        )
        .unwrap();
        assert_eq!(record.id, 12);
        assert!((record.form - 6.4).abs() < 1e-9);
        assert!((record.selected_by_percent - 38.2).abs() < 1e-9);
        assert!((record.expected_goals - 7.81).abs() < 1e-9);
        assert_eq!(record.minutes, 2450);
    }

    #[test]
    fn missing_and_null_fields_default() {
        let record: PlayerRecord =
            serde_json::from_str(r#"{"id": 3, "chance_of_playing_next_round": null, "form": null}"#)
                .unwrap();
        assert_eq!(record.chance_of_playing_next_round, None);
        assert_eq!(record.form, 0.0);
        assert_eq!(record.web_name, "");
        assert_eq!(record.now_cost, 0);
    }

    #[test]
    fn garbage_numbers_become_zero() {
        let record: PlayerRecord =
            serde_json::from_str(r#"{"id": 5, "form": "n/a", "points_per_game": "NaN"}"#).unwrap();
        assert_eq!(record.form, 0.0);
        assert_eq!(record.points_per_game, 0.0);
    }

    #[test]
    fn unscheduled_fixture_has_no_event() {
        let record: FixtureRecord = serde_json::from_str(
            r#"{"id": 40, "event": null, "team_h": 1, "team_a": 2,
                "team_h_difficulty": 3, "team_a_difficulty": 4, "finished": false,
                "kickoff_time": null}"#,
        )
        .unwrap();
        assert_eq!(record.event, None);
        assert_eq!(record.kickoff_time, None);
    }

    #[test]
    fn history_ignores_unknown_keys() {
        let record: HistoryRecord = serde_json::from_str(
            r#"{"fixtures": [], "history": [],
                "history_past": [{"season_name": "2023/24", "total_points": 180,
                                  "minutes": 2900, "start_cost": 80}]}"#,
        )
        .unwrap();
        assert_eq!(record.history_past.len(), 1);
        assert_eq!(record.history_past[0].penalties_scored, 0);
    }
}
