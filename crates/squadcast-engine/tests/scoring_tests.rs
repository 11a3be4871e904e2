// Scoring properties that must hold for any player the upstream feed can
// produce: bounded components, weights acting as plain multipliers, and
// proven history outranking short cameo runs.

use std::collections::HashMap;

use squadcast_core::config::ScoringParams;
use squadcast_core::{
    Availability, Fixture, Player, PlayerHistory, Position, Price, ScoringPreset, SeasonSummary, SubScore,
    Team, WeightVector,
};
use squadcast_engine::scoring::{ScoringContext, ScoringModel};

fn season(label: &str, minutes: u32, points: i32) -> SeasonSummary {
    SeasonSummary {
        season: label.into(),
        total_points: points,
        minutes,
        penalties_scored: 0,
        penalties_missed: 0,
    }
}

fn teams() -> Vec<Team> {
    (1..=4)
        .map(|id| Team {
            id,
            name: format!("Team {id}"),
            short_name: format!("T{id}"),
            strength_overall_home: 1000 + id * 50,
            strength_overall_away: 1000 + id * 40,
        })
        .collect()
}

fn fixtures() -> Vec<Fixture> {
    vec![
        Fixture {
            id: 1,
            gameweek: Some(3),
            home_team: 1,
            away_team: 2,
            home_difficulty: 2,
            away_difficulty: 4,
            finished: false,
            kickoff: None,
        },
        Fixture {
            id: 2,
            gameweek: Some(4),
            home_team: 3,
            away_team: 1,
            home_difficulty: 3,
            away_difficulty: 3,
            finished: false,
            kickoff: None,
        },
    ]
}

/// Players with ordinary, extreme and missing data.
fn awkward_players() -> Vec<Player> {
    let mut ordinary = Player::new(1, "Ordinary", 1, Position::Midfielder, Price::from_tenths(75));
    ordinary.form = 5.5;
    ordinary.points_per_game = 4.8;
    ordinary.ownership = 22.0;
    ordinary.stats.total_points = 60;
    ordinary.stats.minutes = 1100;
    ordinary.expected.goal_involvements = 4.2;

    let mut extreme = Player::new(2, "Extreme", 2, Position::Forward, Price::from_tenths(150));
    extreme.form = 1e9;
    extreme.points_per_game = f64::INFINITY;
    extreme.ownership = 100.0;
    extreme.stats.total_points = 10_000;
    extreme.transfers_in_event = i64::MAX / 2;
    extreme.expected.goals = 1e12;

    let mut broken = Player::new(3, "Broken", 9, Position::Defender, Price::ZERO);
    broken.form = f64::NAN;
    broken.points_per_game = -3.0;
    broken.ownership = f64::NAN;
    broken.stats.total_points = -20;
    broken.availability = Availability::Unavailable;
    broken.transfers_out_event = i64::MAX / 2;

    let fresh = Player::new(4, "Fresh", 3, Position::Goalkeeper, Price::from_tenths(40));

    vec![ordinary, extreme, broken, fresh]
}

fn context() -> ScoringContext {
    let mut histories = HashMap::new();
    histories.insert(
        1,
        PlayerHistory::new(vec![season("2023/24", 2800, 150), season("2024/25", 3100, 170)]),
    );
    histories.insert(2, PlayerHistory::new(vec![season("2024/25", 3400, 400)]));
    histories.insert(3, PlayerHistory::new(vec![season("2024/25", 0, -5)]));
    ScoringContext::new()
        .with_fixtures(fixtures())
        .with_teams(&teams())
        .with_histories(histories)
}

#[test]
fn every_component_is_bounded() {
    let ctx = context();
    for preset in [ScoringPreset::Historical, ScoringPreset::Advanced, ScoringPreset::Preseason] {
        let model = ScoringModel::new(preset.weights(), ScoringParams::default());
        for player in awkward_players() {
            let score = model.score(&player, &ctx);
            assert_eq!(score.components.len(), SubScore::ALL.len());
            for (key, value) in &score.components {
                assert!(
                    (0.0..=100.0).contains(value),
                    "{} {key:?} = {value}",
                    player.name
                );
            }
            assert!(score.total.is_finite(), "{} total {}", player.name, score.total);
        }
    }
}

#[test]
fn total_is_weighted_sum_of_components() {
    let ctx = context();
    let weights = WeightVector::new()
        .with(SubScore::Historical, 2.0)
        .with(SubScore::Form, 0.5)
        .with(SubScore::TeamQuality, 1.5);
    let model = ScoringModel::new(weights.clone(), ScoringParams::default());

    for player in awkward_players() {
        let score = model.score(&player, &ctx);
        let expected: f64 = weights.iter().map(|(k, w)| w * score.component(k)).sum();
        assert!((score.total - expected).abs() < 1e-9, "{}", player.name);
    }
}

#[test]
fn doubling_weights_doubles_total() {
    let ctx = context();
    let base = ScoringPreset::Historical.weights();
    let doubled = base.iter().fold(WeightVector::new(), |acc, (k, w)| acc.with(k, w * 2.0));

    let single = ScoringModel::new(base, ScoringParams::default());
    let double = ScoringModel::new(doubled, ScoringParams::default());
    for player in awkward_players() {
        let a = single.score(&player, &ctx).total;
        let b = double.score(&player, &ctx).total;
        assert!((b - 2.0 * a).abs() < 1e-6, "{}: {a} vs {b}", player.name);
    }
}

#[test]
fn proven_starter_outranks_cameo_player() {
    let mut starter = Player::new(10, "Starter", 1, Position::Midfielder, Price::from_tenths(80));
    starter.ownership = 30.0;
    let mut cameo = Player::new(11, "Cameo", 2, Position::Midfielder, Price::from_tenths(80));
    cameo.ownership = 30.0;

    let mut histories = HashMap::new();
    histories.insert(
        10,
        PlayerHistory::new(vec![season("2023/24", 3000, 200), season("2024/25", 3000, 210)]),
    );
    // brilliant per 90, far too few minutes to count
    histories.insert(11, PlayerHistory::new(vec![season("2024/25", 300, 40)]));
    let ctx = ScoringContext::new().with_histories(histories);

    let model = ScoringModel::new(WeightVector::single(SubScore::Historical), ScoringParams::default());
    let starter_score = model.score(&starter, &ctx).total;
    let cameo_score = model.score(&cameo, &ctx).total;
    assert!(
        starter_score > cameo_score,
        "starter {starter_score} vs cameo {cameo_score}"
    );
    assert!(cameo_score <= ScoringParams::default().unknown_ceiling);
}

#[test]
fn scoring_is_order_independent() {
    let ctx = context();
    let model = ScoringModel::new(ScoringPreset::Historical.weights(), ScoringParams::default());
    let players = awkward_players();
    let mut reversed = players.clone();
    reversed.reverse();

    let forward: HashMap<u32, f64> = model
        .score_all(&players, &ctx)
        .into_iter()
        .map(|sp| (sp.player.id(), sp.total()))
        .collect();
    for sp in model.score_all(&reversed, &ctx) {
        assert_eq!(forward[&sp.player.id()], sp.total());
    }
}
