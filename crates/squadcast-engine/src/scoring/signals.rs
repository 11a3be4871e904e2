// Current-season sub-scores: form, fixtures, value, ownership, expected
// statistics and team quality.

use squadcast_core::config::ScoringParams;
use squadcast_core::fixture::upcoming_for_team;
use squadcast_core::{Fixture, Player, PlayerHistory, Position, TeamId};

use super::clamp_score;

/// Recent form, points per game and transfer momentum.
pub fn form_score(player: &Player, params: &ScoringParams) -> f64 {
    let ppg = if player.points_per_game > 0.0 {
        player.points_per_game
    } else {
        player.form
    };
    let net_transfers = (player.transfers_in_event - player.transfers_out_event) as f64;
    let momentum = if params.momentum_scale > 0.0 {
        (net_transfers / params.momentum_scale).clamp(-1.0, 1.0)
    } else {
        0.0
    };
    clamp_score(player.form * 10.0 + ppg * 5.0 + momentum * 10.0)
}

/// Ease of the next few fixtures. Neutral when none are known.
pub fn fixture_score(player: &Player, fixtures: &[Fixture], params: &ScoringParams) -> f64 {
    let upcoming = upcoming_for_team(fixtures, player.team, params.fixture_window);
    if upcoming.is_empty() {
        return clamp_score(params.neutral_fixture_score);
    }

    let total: f64 = upcoming
        .iter()
        .map(|f| {
            let ease = 6.0 - f64::from(f.difficulty);
            if f.is_home {
                ease * params.home_multiplier
            } else {
                ease * params.away_multiplier
            }
        })
        .sum();
    clamp_score(total / upcoming.len() as f64 * 20.0)
}

/// Expected points per million.
pub fn value_score(
    player: &Player,
    history: Option<&PlayerHistory>,
    params: &ScoringParams,
) -> f64 {
    let price = player.price().millions();
    if price <= 0.0 {
        return 0.0;
    }

    let season_estimate = player.points_per_game * params.season_games;
    let last_season = history
        .and_then(|h| h.latest())
        .map(|s| f64::from(s.total_points))
        .filter(|&pts| pts > 0.0);

    let expected = match last_season {
        Some(last) => {
            last * params.last_season_blend + season_estimate * (1.0 - params.last_season_blend)
        }
        None => season_estimate,
    };
    clamp_score(expected / price * 5.0)
}

/// Favour under-owned players in form; discount the template picks.
pub fn ownership_score(player: &Player) -> f64 {
    let own = player.ownership;
    let form = player.form;
    if own < 5.0 && form > 5.0 {
        60.0
    } else if own < 10.0 && form > 4.0 {
        40.0
    } else if own < 20.0 {
        30.0
    } else if own > 40.0 {
        10.0
    } else {
        20.0
    }
}

/// Per-90 expected goal involvement, weighted by position. Defensive
/// positions also earn credit for a low expected-goals-conceded rate.
pub fn expected_score(player: &Player) -> f64 {
    if player.stats.minutes == 0 {
        return 0.0;
    }
    let nineties = f64::from(player.stats.minutes.max(90)) / 90.0;
    let xg = player.expected.goals / nineties;
    let xa = player.expected.assists / nineties;
    let xgc = player.expected.goals_conceded / nineties;

    let raw = match player.position() {
        Position::Forward => xg * 100.0 + xa * 50.0,
        Position::Midfielder => xg * 80.0 + xa * 60.0,
        Position::Defender => xg * 60.0 + xa * 40.0 + (100.0 - xgc * 10.0).max(0.0) * 0.3,
        Position::Goalkeeper => (50.0 - xgc * 10.0).max(0.0),
    };
    clamp_score(raw)
}

/// Bonus for belonging to one of the strongest clubs.
pub fn team_quality_score(team: TeamId, ranking: &[TeamId]) -> f64 {
    match ranking.iter().position(|&t| t == team) {
        Some(rank) if rank < 3 => 100.0,
        Some(rank) if rank < 6 => 60.0,
        Some(rank) if rank < 10 => 30.0,
        _ => 0.0,
    }
}
