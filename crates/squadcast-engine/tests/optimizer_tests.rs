// Integration tests for squad selection.
//
// These drive the public optimizer API with a realistic candidate pool and
// check the finished squad against every selection rule, then carry the
// squad through lineup and captain selection.

use std::collections::{BTreeMap, HashMap};

use squadcast_core::config::{CaptainConfig, OptimizerConfig, ScoringParams};
use squadcast_core::squad::MAX_PER_TEAM;
use squadcast_core::{Fixture, Player, PlayerId, Position, Price, ScoringPreset, Squad, TeamId};
use squadcast_engine::optimizer::{OptimizeError, SolveStatus, SquadOptimizer};
use squadcast_engine::projection::project_all;
use squadcast_engine::scoring::{PlayerScore, ScoredPlayer, ScoringContext, ScoringModel};
use squadcast_engine::strategy::CaptainSelector;
use squadcast_engine::{optimize_squad, select_lineup};

// ===========================================================================
// Test helpers
// ===========================================================================

const BUDGET: u32 = 1000;

/// (position, price in tenths) for every candidate; ids follow list order.
fn layout() -> Vec<(Position, u32)> {
    use Position::*;
    let mut out = Vec::new();
    for price in [55, 50, 40, 45] {
        out.push((Goalkeeper, price));
    }
    for price in [40, 45, 50, 55, 60, 45, 50, 65, 70, 42] {
        out.push((Defender, price));
    }
    for price in [50, 55, 60, 65, 70, 80, 90, 100, 105, 125, 130, 48] {
        out.push((Midfielder, price));
    }
    for price in [45, 55, 60, 70, 80, 95, 110, 140] {
        out.push((Forward, price));
    }
    out
}

fn team_for(id: PlayerId) -> TeamId {
    id % 10 + 1
}

fn pool_players() -> Vec<Player> {
    layout()
        .into_iter()
        .enumerate()
        .map(|(i, (position, tenths))| {
            let id = i as PlayerId + 1;
            let mut p = Player::new(id, format!("Player {id}"), team_for(id), position, Price::from_tenths(tenths));
            p.stats.minutes = 2000;
            p.points_per_game = f64::from(tenths) / 15.0;
            p.form = 3.0 + f64::from(id % 5);
            p.ownership = f64::from(tenths) / 4.0;
            p
        })
        .collect()
}

/// Scores rise with price, with a small id-dependent spread so no two tie.
fn scored_pool() -> Vec<ScoredPlayer> {
    pool_players()
        .into_iter()
        .map(|player| {
            let total = f64::from(player.price().tenths()) + f64::from(player.id() * 7 % 13) / 10.0;
            ScoredPlayer {
                score: PlayerScore {
                    player_id: player.id(),
                    components: BTreeMap::new(),
                    total,
                },
                player,
            }
        })
        .collect()
}

fn config() -> OptimizerConfig {
    OptimizerConfig {
        time_limit_secs: 30,
        ..OptimizerConfig::default()
    }
}

fn assert_valid_squad(squad: &Squad) {
    assert_eq!(squad.players().len(), 15);
    for (position, quota) in [
        (Position::Goalkeeper, 2),
        (Position::Defender, 5),
        (Position::Midfielder, 5),
        (Position::Forward, 3),
    ] {
        assert_eq!(squad.by_position(position).count(), quota, "{position}");
    }
    let mut per_team: HashMap<TeamId, usize> = HashMap::new();
    for p in squad.players() {
        *per_team.entry(p.team).or_default() += 1;
    }
    assert!(per_team.values().all(|&n| n <= MAX_PER_TEAM), "{per_team:?}");
    assert!(squad.spent() <= Price::from_tenths(BUDGET), "spent {}", squad.spent());
}

fn sorted_ids(squad: &Squad) -> Vec<PlayerId> {
    let mut ids = squad.ids();
    ids.sort_unstable();
    ids
}

// ===========================================================================
// Squad selection
// ===========================================================================

#[test]
fn selects_a_valid_squad() {
    let solution = SquadOptimizer::new(config())
        .optimize(&scored_pool(), Price::from_tenths(BUDGET))
        .unwrap();

    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_valid_squad(&solution.squad);
    assert!(solution.squad.formation().is_valid());

    let objective: f64 = solution.scored.iter().map(ScoredPlayer::total).sum();
    assert!((solution.objective - objective).abs() < 1e-9);
}

#[test]
fn composition_rules_hold() {
    let solution = SquadOptimizer::new(config())
        .optimize(&scored_pool(), Price::from_tenths(BUDGET))
        .unwrap();
    let players = solution.squad.players();

    let premiums = players.iter().filter(|p| p.price() >= Price::from_tenths(100)).count();
    assert!(premiums >= 2, "{premiums} premiums");

    let fodder = players.iter().filter(|p| p.price() <= Price::from_tenths(45)).count();
    assert!(fodder <= 3, "{fodder} budget players");

    let keepers: Vec<Price> = solution
        .squad
        .by_position(Position::Goalkeeper)
        .map(Player::price)
        .collect();
    assert!(keepers.iter().any(|&p| p >= Price::from_tenths(45)), "{keepers:?}");
    assert!(keepers.iter().any(|&p| p <= Price::from_tenths(40)), "{keepers:?}");
}

#[test]
fn selection_ignores_input_order() {
    let optimizer = SquadOptimizer::new(config());
    let budget = Price::from_tenths(BUDGET);

    let pool = scored_pool();
    let mut reversed = pool.clone();
    reversed.reverse();
    let mut interleaved = pool.clone();
    interleaved.sort_by_key(|sp| (sp.player.id() % 3, sp.player.id()));

    let first = sorted_ids(&optimizer.optimize(&pool, budget).unwrap().squad);
    assert_eq!(first, sorted_ids(&optimizer.optimize(&reversed, budget).unwrap().squad));
    assert_eq!(first, sorted_ids(&optimizer.optimize(&interleaved, budget).unwrap().squad));
}

#[test]
fn unaffordable_pool_is_infeasible() {
    let pool: Vec<ScoredPlayer> = scored_pool()
        .into_iter()
        .map(|sp| {
            let mut player = Player::new(
                sp.player.id(),
                sp.player.name.clone(),
                sp.player.team,
                sp.player.position(),
                Price::from_tenths(70),
            );
            player.stats.minutes = 2000;
            ScoredPlayer { player, ..sp }
        })
        .collect();

    let err = SquadOptimizer::new(config())
        .optimize(&pool, Price::from_tenths(BUDGET))
        .unwrap_err();
    assert!(matches!(err, OptimizeError::Infeasible { .. }), "{err:?}");
}

fn no_time_config() -> OptimizerConfig {
    OptimizerConfig {
        time_limit_secs: 0,
        ..OptimizerConfig::default()
    }
}

#[test]
fn time_limited_solve_returns_a_valid_squad() {
    let solution = SquadOptimizer::new(no_time_config())
        .optimize(&scored_pool(), Price::from_tenths(BUDGET))
        .unwrap();

    assert_eq!(solution.status, SolveStatus::TimeLimited);
    assert_valid_squad(&solution.squad);

    let players = solution.squad.players();
    let premiums = players.iter().filter(|p| p.price() >= Price::from_tenths(100)).count();
    assert!(premiums >= 2, "{premiums} premiums");
    let fodder = players.iter().filter(|p| p.price() <= Price::from_tenths(45)).count();
    assert!(fodder <= 3, "{fodder} budget players");
}

#[test]
fn time_limited_solve_without_a_legal_squad_times_out() {
    // four clubs can supply at most 12 players
    let pool: Vec<ScoredPlayer> = scored_pool()
        .into_iter()
        .map(|sp| {
            let mut player = sp.player.clone();
            player.team = sp.player.id() % 4 + 1;
            ScoredPlayer { player, ..sp }
        })
        .collect();

    let err = SquadOptimizer::new(no_time_config())
        .optimize(&pool, Price::from_tenths(BUDGET))
        .unwrap_err();
    assert!(matches!(err, OptimizeError::TimedOut { .. }), "{err:?}");
}

// ===========================================================================
// Scoring through to captaincy
// ===========================================================================

fn fixtures() -> Vec<Fixture> {
    (0..5)
        .map(|i| Fixture {
            id: i + 1,
            gameweek: Some(7),
            home_team: i * 2 + 1,
            away_team: i * 2 + 2,
            home_difficulty: 2 + (i % 3) as u8,
            away_difficulty: 3,
            finished: false,
            kickoff: None,
        })
        .collect()
}

#[test]
fn scored_squad_feeds_lineup_and_captain() {
    let players = pool_players();
    let fixtures = fixtures();
    let model = ScoringModel::new(ScoringPreset::Advanced.weights(), ScoringParams::default());
    let ctx = ScoringContext::new().with_fixtures(fixtures.clone());

    let solution = optimize_squad(&players, &model, &ctx, Price::from_tenths(BUDGET), &config()).unwrap();
    assert_valid_squad(&solution.squad);

    let predictions = project_all(solution.squad.players(), &fixtures, 7);
    let lineup = select_lineup(&solution.squad, &predictions);
    assert_eq!(lineup.starters.len(), 11);
    assert_eq!(lineup.bench.len(), 4);

    let pick = CaptainSelector::new(CaptainConfig::default())
        .select(&lineup.starters, &predictions, &fixtures, 7, false)
        .unwrap();
    assert!(lineup.is_starting(pick.captain.player_id));
    let vice = pick.vice_captain.unwrap();
    assert_ne!(vice.player_id, pick.captain.player_id);
    assert!(lineup.is_starting(vice.player_id));
}
