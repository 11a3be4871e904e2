// Past-season sub-scores: historical strength, consistency and elite record.
//
// The historical score projects a recency-weighted points-per-90 rate onto a
// full season and maps the projection through a step function, so a handful
// of strong cameo appearances cannot outrank a proven starter.

use squadcast_core::config::ScoringParams;
use squadcast_core::{Player, PlayerHistory, SeasonSummary};

use super::clamp_score;

// ---------------------------------------------------------------------------
// Historical
// ---------------------------------------------------------------------------

/// Historical sub-score in [0, 100].
///
/// Falls back to the capped unknown-player score when the player has no
/// season above the minutes threshold.
pub fn historical_score(
    player: &Player,
    history: Option<&PlayerHistory>,
    params: &ScoringParams,
) -> f64 {
    let raw = match history.and_then(|h| projected_season_points(h, params)) {
        Some(points) => step_score(points, params),
        None => unknown_player_score(player, params),
    };
    clamp_score(apply_reality_check(raw, player.ownership, params))
}

/// Recency- and minutes-weighted per-90 rate projected to a season, after
/// gap and declining-minutes penalties. `None` when no season qualifies.
pub fn projected_season_points(history: &PlayerHistory, params: &ScoringParams) -> Option<f64> {
    let mut weighted = 0.0;
    let mut weight_sum = 0.0;

    let seasons = history.recent(params.recency_weights.len());
    for (season, &recency) in seasons.zip(&params.recency_weights) {
        if season.minutes < params.min_season_minutes || season.minutes == 0 {
            continue;
        }
        let per_90 = f64::from(season.total_points) / f64::from(season.minutes) * 90.0;
        let reliability = (f64::from(season.minutes) / params.full_season_minutes).min(1.0);
        let weight = recency * reliability;
        weighted += per_90 * weight;
        weight_sum += weight;
    }

    if weight_sum <= 0.0 {
        return None;
    }

    let projected = weighted / weight_sum * params.projection_games;
    Some(projected * gap_factor(history, params))
}

/// Penalty multiplier for a missing latest season or a sharp drop in minutes.
fn gap_factor(history: &PlayerHistory, params: &ScoringParams) -> f64 {
    let mut factor = 1.0;

    if let Some(latest) = &params.latest_completed_season {
        if !history.contains_season(latest) {
            factor *= params.gap_penalty;
        }
    }

    let recent: Vec<&SeasonSummary> = history.recent(2).collect();
    if let [last, previous] = recent.as_slice() {
        let dropped = f64::from(last.minutes) < f64::from(previous.minutes) * 0.5;
        if dropped && last.minutes < params.declining_minutes_floor {
            factor *= params.declining_minutes_penalty;
        }
    }

    factor
}

/// Map projected points through the configured breakpoints.
pub fn step_score(points: f64, params: &ScoringParams) -> f64 {
    params
        .step_breakpoints
        .iter()
        .find(|step| points >= step.min_points)
        .map(|step| step.score)
        .unwrap_or_else(|| (points * params.below_steps_rate).max(params.below_steps_floor))
}

/// Low, capped score for players with no usable history.
pub fn unknown_player_score(player: &Player, params: &ScoringParams) -> f64 {
    let points = f64::from(player.stats.total_points.max(0));
    (points * params.unknown_multiplier).clamp(params.unknown_floor, params.unknown_ceiling)
}

/// Scale down high scores for players almost nobody owns. The first
/// matching tier applies.
pub fn apply_reality_check(score: f64, ownership: f64, params: &ScoringParams) -> f64 {
    params
        .reality_check
        .iter()
        .find(|tier| score > tier.min_score && ownership < tier.max_ownership)
        .map_or(score, |tier| score * tier.factor)
}

// ---------------------------------------------------------------------------
// Consistency and elite record
// ---------------------------------------------------------------------------

/// Reward regular minutes and low season-to-season variance in points.
pub fn consistency_score(
    player: &Player,
    history: Option<&PlayerHistory>,
    params: &ScoringParams,
) -> f64 {
    let Some(history) = history.filter(|h| !h.is_empty()) else {
        return 0.0;
    };
    let seasons: Vec<&SeasonSummary> = history.recent(3).collect();

    let avg_minutes =
        seasons.iter().map(|s| f64::from(s.minutes)).sum::<f64>() / seasons.len() as f64;
    let minutes_score = (avg_minutes / params.full_season_minutes).min(1.0) * 50.0;

    let points: Vec<f64> = seasons
        .iter()
        .filter(|s| s.minutes > params.min_season_minutes)
        .map(|s| f64::from(s.total_points))
        .collect();

    let bonus = if seasons.len() >= 2 && points.len() >= 2 {
        let mean = points.iter().sum::<f64>() / points.len() as f64;
        if mean > 0.0 {
            let variance =
                points.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / points.len() as f64;
            (1.0 - (variance.sqrt() / mean).min(1.0)) * 50.0
        } else {
            0.0
        }
    } else {
        25.0
    };

    clamp_score(apply_reality_check(minutes_score + bonus, player.ownership, params))
}

/// Tiered bonus for repeated 200+ and 180+ point seasons.
pub fn elite_score(history: Option<&PlayerHistory>) -> f64 {
    let Some(history) = history else {
        return 0.0;
    };
    let elite = history.seasons.iter().filter(|s| s.total_points >= 200).count();
    let very_good = history.seasons.iter().filter(|s| s.total_points >= 180).count();

    match (elite, very_good) {
        (e, _) if e >= 3 => 100.0,
        (2, _) => 80.0,
        (1, _) => 60.0,
        (_, v) if v >= 2 => 40.0,
        (_, 1) => 20.0,
        _ => 0.0,
    }
}
