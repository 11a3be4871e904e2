// Single-gameweek point projections.
//
// Points per game scaled by fixture difficulty, venue, recent form and the
// chance of playing. Teams with two fixtures in the gameweek get both.

use std::collections::HashMap;

use squadcast_core::fixture::fixtures_in_gameweek;
use squadcast_core::{Availability, Fixture, Player, PlayerId};

pub type Predictions = HashMap<PlayerId, f64>;

fn difficulty_multiplier(difficulty: u8) -> f64 {
    match difficulty {
        0 | 1 => 1.3,
        2 => 1.15,
        3 => 1.0,
        4 => 0.85,
        _ => 0.7,
    }
}

/// Projected points for `player` in `gameweek`. Zero in a blank gameweek.
pub fn project_player(player: &Player, fixtures: &[Fixture], gameweek: u32) -> f64 {
    let form_factor = if player.form > 0.0 {
        (player.form / 5.0).min(1.5)
    } else {
        1.0
    };

    let raw: f64 = fixtures_in_gameweek(fixtures, player.team, gameweek)
        .iter()
        .map(|f| {
            let venue = if f.is_home { 1.1 } else { 0.9 };
            player.points_per_game * difficulty_multiplier(f.difficulty) * venue * form_factor
        })
        .sum();

    let availability = match player.availability {
        Availability::Unavailable => 0.1,
        _ => player.playing_probability(),
    };
    let projected = raw * availability;
    if projected.is_finite() {
        projected.max(0.0)
    } else {
        0.0
    }
}

pub fn project_all<'a>(
    players: impl IntoIterator<Item = &'a Player>,
    fixtures: &[Fixture],
    gameweek: u32,
) -> Predictions {
    players
        .into_iter()
        .map(|p| (p.id(), project_player(p, fixtures, gameweek)))
        .collect()
}

/// Earliest gameweek that still has an unfinished fixture.
pub fn next_gameweek(fixtures: &[Fixture]) -> Option<u32> {
    fixtures
        .iter()
        .filter(|f| !f.finished)
        .filter_map(|f| f.gameweek)
        .min()
}
