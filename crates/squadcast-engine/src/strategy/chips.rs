// Chip timing: wildcard, free hit, bench boost and triple captain.
//
// Each chip is evaluated on its own triggers; confidence is the mean of the
// triggered factors. At most one chip is recommended per gameweek.

use std::fmt;

use serde::{Deserialize, Serialize};

use squadcast_core::config::ChipConfig;
use squadcast_core::fixture::{fixtures_in_gameweek, upcoming_for_team};
use squadcast_core::{Fixture, Player, Price, Squad};

use crate::lineup::Lineup;
use crate::projection::Predictions;
use crate::strategy::health::assess_squad;

/// Last gameweek of the first half of the season.
const FIRST_HALF_END: u32 = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chip {
    Wildcard,
    FreeHit,
    BenchBoost,
    TripleCaptain,
}

impl Chip {
    pub const ALL: [Chip; 4] = [Chip::Wildcard, Chip::FreeHit, Chip::BenchBoost, Chip::TripleCaptain];
}

impl fmt::Display for Chip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Chip::Wildcard => "wildcard",
            Chip::FreeHit => "free hit",
            Chip::BenchBoost => "bench boost",
            Chip::TripleCaptain => "triple captain",
        };
        f.write_str(name)
    }
}

/// Chips already played this season, with the gameweek they were used in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChipUsage {
    pub used: Vec<(Chip, u32)>,
}

impl ChipUsage {
    fn half(gameweek: u32) -> u8 {
        if gameweek <= FIRST_HALF_END {
            1
        } else {
            2
        }
    }

    /// Each chip can be played once per half of the season.
    pub fn is_available(&self, chip: Chip, gameweek: u32) -> bool {
        !self
            .used
            .iter()
            .any(|&(c, gw)| c == chip && Self::half(gw) == Self::half(gameweek))
    }

    pub fn record(&mut self, chip: Chip, gameweek: u32) {
        self.used.push((chip, gameweek));
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChipRecommendation {
    pub chip: Chip,
    pub confidence: f64,
    pub expected_benefit: f64,
    pub reasons: Vec<String>,
}

impl ChipRecommendation {
    fn from_factors(chip: Chip, factors: Vec<(f64, String)>, expected_benefit: f64) -> Option<Self> {
        if factors.is_empty() {
            return None;
        }
        let confidence = factors.iter().map(|(f, _)| f).sum::<f64>() / factors.len() as f64;
        Some(Self {
            chip,
            confidence,
            expected_benefit,
            reasons: factors.into_iter().map(|(_, r)| r).collect(),
        })
    }
}

/// Everything the chip evaluation reads for one gameweek.
#[derive(Debug, Clone, Copy)]
pub struct ChipContext<'a> {
    pub squad: &'a Squad,
    pub lineup: &'a Lineup,
    pub predictions: &'a Predictions,
    pub fixtures: &'a [Fixture],
    pub gameweek: u32,
}

impl ChipContext<'_> {
    fn predicted(&self, player: &Player) -> f64 {
        self.predictions.get(&player.id()).copied().unwrap_or(0.0)
    }

    fn fixture_count(&self, player: &Player) -> usize {
        fixtures_in_gameweek(self.fixtures, player.team, self.gameweek).len()
    }
}

#[derive(Debug, Clone)]
pub struct ChipStrategy {
    config: ChipConfig,
}

impl ChipStrategy {
    pub fn new(config: ChipConfig) -> Self {
        Self { config }
    }

    pub fn evaluate_wildcard(&self, ctx: &ChipContext<'_>) -> Option<ChipRecommendation> {
        let cfg = &self.config;
        let issues = assess_squad(ctx.squad);
        let injured = issues.iter().filter(|i| i.is_injury()).count();
        let mut factors = Vec::new();

        if issues.len() >= cfg.wildcard_team_issues {
            factors.push((0.9, format!("{} squad issues", issues.len())));
        }
        if injured >= cfg.wildcard_injuries {
            factors.push((0.85, format!("{injured} players unavailable")));
        }

        let difficulties: Vec<f64> = ctx
            .lineup
            .starters
            .iter()
            .filter_map(|p| {
                let upcoming = upcoming_for_team(ctx.fixtures, p.team, 5);
                if upcoming.is_empty() {
                    None
                } else {
                    let total: f64 = upcoming.iter().map(|f| f64::from(f.difficulty)).sum();
                    Some(total / upcoming.len() as f64)
                }
            })
            .collect();
        if !difficulties.is_empty() {
            let avg = difficulties.iter().sum::<f64>() / difficulties.len() as f64;
            if avg > cfg.wildcard_difficulty {
                factors.push((0.75, format!("tough run ahead (avg difficulty {avg:.1})")));
            }
        }

        if cfg.wildcard_windows.contains(&ctx.gameweek) {
            factors.push((0.6, format!("gameweek {} is a common wildcard window", ctx.gameweek)));
        }

        let benefit = (issues.len() * 2 + injured * 3) as f64;
        ChipRecommendation::from_factors(Chip::Wildcard, factors, benefit)
    }

    pub fn evaluate_free_hit(&self, ctx: &ChipContext<'_>) -> Option<ChipRecommendation> {
        let cfg = &self.config;
        let mut factors = Vec::new();

        let playing = ctx
            .squad
            .players()
            .iter()
            .filter(|p| ctx.fixture_count(p) > 0)
            .count();
        if playing < cfg.free_hit_min_playing {
            factors.push((0.95, format!("only {playing} squad players have a fixture")));
        }

        let swing = self.fixture_swing(ctx);
        if swing > cfg.free_hit_fixture_swing {
            factors.push((0.8, format!("fixture swing of {swing:.1}")));
        }

        let rotation_risks = ctx
            .squad
            .players()
            .iter()
            .filter(|p| {
                p.stats.minutes < cfg.rotation_risk_max_minutes
                    && p.price() >= Price::from_millions(cfg.rotation_risk_min_price)
            })
            .count();
        if rotation_risks >= cfg.free_hit_rotation_risks {
            factors.push((0.7, format!("{rotation_risks} expensive rotation risks")));
        }

        let benefit = (11 - playing.min(11)) as f64 * 3.0 + swing.max(0.0) * 5.0;
        ChipRecommendation::from_factors(Chip::FreeHit, factors, benefit)
    }

    /// Starters' average difficulty minus the average of the gameweek's 11
    /// easiest team fixtures.
    fn fixture_swing(&self, ctx: &ChipContext<'_>) -> f64 {
        let current: Vec<f64> = ctx
            .lineup
            .starters
            .iter()
            .filter_map(|p| fixtures_in_gameweek(ctx.fixtures, p.team, ctx.gameweek).first().copied())
            .map(|f| f64::from(f.difficulty))
            .collect();

        let mut all: Vec<f64> = ctx
            .fixtures
            .iter()
            .filter(|f| f.gameweek == Some(ctx.gameweek))
            .flat_map(|f| [f64::from(f.home_difficulty), f64::from(f.away_difficulty)])
            .collect();

        if current.is_empty() || all.is_empty() {
            return 0.0;
        }
        all.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        all.truncate(11);

        let current_avg = current.iter().sum::<f64>() / current.len() as f64;
        let easiest_avg = all.iter().sum::<f64>() / all.len() as f64;
        current_avg - easiest_avg
    }

    pub fn evaluate_bench_boost(&self, ctx: &ChipContext<'_>) -> Option<ChipRecommendation> {
        let cfg = &self.config;
        let bench = &ctx.lineup.bench;
        if bench.iter().any(|p| !p.is_fully_fit()) {
            return None;
        }

        let bench_points: f64 = bench.iter().map(|p| ctx.predicted(p)).sum();
        let doubles = bench.iter().filter(|p| ctx.fixture_count(p) >= 2).count();
        let bench_value: Price = bench.iter().map(|p| p.price()).sum();

        let mut factors = Vec::new();
        if bench_points >= cfg.bench_boost_min_points {
            factors.push((0.85, format!("bench projected {bench_points:.1} points")));
        }
        if doubles >= 2 {
            factors.push((0.9, format!("{doubles} bench players double up")));
        }
        if bench_value.millions() >= cfg.bench_boost_min_value {
            factors.push((0.7, format!("bench worth {bench_value}")));
        }
        factors.push((0.8, "whole bench available".to_string()));

        ChipRecommendation::from_factors(Chip::BenchBoost, factors, bench_points)
    }

    pub fn evaluate_triple_captain(&self, ctx: &ChipContext<'_>) -> Option<ChipRecommendation> {
        let cfg = &self.config;
        let best = ctx.lineup.starters.iter().max_by(|a, b| {
            ctx.predicted(a)
                .partial_cmp(&ctx.predicted(b))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.id().cmp(&a.id()))
        })?;
        let predicted = ctx.predicted(best);
        let fixtures = fixtures_in_gameweek(ctx.fixtures, best.team, ctx.gameweek);

        let mut factors = Vec::new();
        if predicted >= cfg.triple_captain_min_points {
            factors.push((0.85, format!("{} projected {predicted:.1}", best.name)));
        }
        if fixtures.len() >= 2 {
            factors.push((0.95, format!("{} has a double gameweek", best.name)));
        }
        if !fixtures.is_empty() && fixtures.iter().all(|f| f.difficulty <= 2) {
            factors.push((0.9, "easy fixture".to_string()));
        }
        if best.price() >= Price::from_millions(cfg.triple_captain_premium_price) {
            factors.push((0.75, format!("premium pick ({})", best.price())));
        }

        ChipRecommendation::from_factors(Chip::TripleCaptain, factors, predicted)
    }

    fn min_benefit(&self, chip: Chip) -> f64 {
        match chip {
            Chip::Wildcard => self.config.min_benefit_wildcard,
            Chip::FreeHit => self.config.min_benefit_free_hit,
            Chip::BenchBoost => self.config.min_benefit_bench_boost,
            Chip::TripleCaptain => self.config.min_benefit_triple_captain,
        }
    }

    /// Every still-available chip whose triggers fired, regardless of benefit.
    pub fn evaluate_all(&self, ctx: &ChipContext<'_>, usage: &ChipUsage) -> Vec<ChipRecommendation> {
        Chip::ALL
            .into_iter()
            .filter(|&chip| usage.is_available(chip, ctx.gameweek))
            .filter_map(|chip| match chip {
                Chip::Wildcard => self.evaluate_wildcard(ctx),
                Chip::FreeHit => self.evaluate_free_hit(ctx),
                Chip::BenchBoost => self.evaluate_bench_boost(ctx),
                Chip::TripleCaptain => self.evaluate_triple_captain(ctx),
            })
            .collect()
    }

    /// The single chip worth playing this gameweek, if any: among chips that
    /// clear their minimum benefit, the highest benefit times confidence.
    pub fn recommend(&self, ctx: &ChipContext<'_>, usage: &ChipUsage) -> Option<ChipRecommendation> {
        self.evaluate_all(ctx, usage)
            .into_iter()
            .filter(|r| r.expected_benefit >= self.min_benefit(r.chip))
            .fold(None, |best: Option<ChipRecommendation>, r| match best {
                Some(b) if b.expected_benefit * b.confidence >= r.expected_benefit * r.confidence => Some(b),
                _ => Some(r),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineup::select_lineup;
    use squadcast_core::{Availability, PlayerId, Position};

    fn squad() -> Squad {
        let layout = [
            (Position::Goalkeeper, 2),
            (Position::Defender, 5),
            (Position::Midfielder, 5),
            (Position::Forward, 3),
        ];
        let mut players = Vec::new();
        let mut id = 0;
        for (position, n) in layout {
            for _ in 0..n {
                id += 1;
                let mut p = Player::new(id, format!("P{id}"), id % 5 + 1, position, Price::from_tenths(60));
                p.form = 4.0;
                p.stats.minutes = 1500;
                players.push(p);
            }
        }
        Squad::new(players, Price::from_tenths(1000)).unwrap()
    }

    fn fixture(id: u32, gw: u32, home: u32, away: u32, difficulty: u8) -> Fixture {
        Fixture {
            id,
            gameweek: Some(gw),
            home_team: home,
            away_team: away,
            home_difficulty: difficulty,
            away_difficulty: difficulty,
            finished: false,
            kickoff: None,
        }
    }

    /// Every squad team (1-5) plays once in `gw`.
    fn normal_week(gw: u32) -> Vec<Fixture> {
        vec![
            fixture(1, gw, 1, 2, 3),
            fixture(2, gw, 3, 4, 3),
            fixture(3, gw, 5, 6, 3),
        ]
    }

    fn flat_predictions(value: f64) -> Predictions {
        (1..=15).map(|id: PlayerId| (id, value)).collect()
    }

    #[test]
    fn usage_is_tracked_per_half() {
        let mut usage = ChipUsage::default();
        usage.record(Chip::Wildcard, 8);
        assert!(!usage.is_available(Chip::Wildcard, 15));
        assert!(usage.is_available(Chip::Wildcard, 25));
        assert!(usage.is_available(Chip::FreeHit, 15));
    }

    #[test]
    fn injuries_trigger_wildcard() {
        let mut players = squad().into_players();
        for p in players.iter_mut().take(4) {
            p.availability = Availability::Unavailable;
        }
        let squad = Squad::new(players, Price::from_tenths(1000)).unwrap();
        let preds = flat_predictions(3.0);
        let lineup = select_lineup(&squad, &preds);
        let fixtures = normal_week(12);
        let ctx = ChipContext {
            squad: &squad,
            lineup: &lineup,
            predictions: &preds,
            fixtures: &fixtures,
            gameweek: 12,
        };
        let rec = ChipStrategy::new(ChipConfig::default()).evaluate_wildcard(&ctx).unwrap();
        // 4 issues, 4 injured: 4*2 + 4*3
        assert!((rec.expected_benefit - 20.0).abs() < 1e-9);
        assert!((rec.confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn blank_gameweek_triggers_free_hit() {
        let squad = squad();
        let preds = flat_predictions(3.0);
        let lineup = select_lineup(&squad, &preds);
        // only teams 1 and 2 play: 6 squad players
        let fixtures = vec![fixture(1, 20, 1, 2, 3)];
        let ctx = ChipContext {
            squad: &squad,
            lineup: &lineup,
            predictions: &preds,
            fixtures: &fixtures,
            gameweek: 20,
        };
        let rec = ChipStrategy::new(ChipConfig::default()).evaluate_free_hit(&ctx).unwrap();
        assert_eq!(rec.chip, Chip::FreeHit);
        assert!(rec.expected_benefit >= 15.0);
    }

    #[test]
    fn injured_bench_blocks_bench_boost() {
        let squad = squad();
        let preds = flat_predictions(6.0);
        let mut lineup = select_lineup(&squad, &preds);
        let fixtures = normal_week(12);
        let strategy = ChipStrategy::new(ChipConfig::default());

        let ctx = ChipContext {
            squad: &squad,
            lineup: &lineup,
            predictions: &preds,
            fixtures: &fixtures,
            gameweek: 12,
        };
        let rec = strategy.evaluate_bench_boost(&ctx).unwrap();
        assert!((rec.expected_benefit - 24.0).abs() < 1e-9);

        lineup.bench[0].availability = Availability::Unavailable;
        let ctx = ChipContext {
            squad: &squad,
            lineup: &lineup,
            predictions: &preds,
            fixtures: &fixtures,
            gameweek: 12,
        };
        assert!(strategy.evaluate_bench_boost(&ctx).is_none());
    }

    #[test]
    fn doubtful_bench_blocks_bench_boost() {
        let squad = squad();
        let preds = flat_predictions(6.0);
        let mut lineup = select_lineup(&squad, &preds);
        lineup.bench[1].chance_of_playing = Some(50);
        let fixtures = normal_week(12);
        let ctx = ChipContext {
            squad: &squad,
            lineup: &lineup,
            predictions: &preds,
            fixtures: &fixtures,
            gameweek: 12,
        };
        assert!(ChipStrategy::new(ChipConfig::default()).evaluate_bench_boost(&ctx).is_none());
    }

    #[test]
    fn rotation_risk_thresholds_are_configurable() {
        // every squad player costs 6.0 with 1500 minutes
        let squad = squad();
        let preds = flat_predictions(3.0);
        let lineup = select_lineup(&squad, &preds);
        let fixtures = normal_week(12);
        let ctx = ChipContext {
            squad: &squad,
            lineup: &lineup,
            predictions: &preds,
            fixtures: &fixtures,
            gameweek: 12,
        };
        assert!(ChipStrategy::new(ChipConfig::default()).evaluate_free_hit(&ctx).is_none());

        let loose = ChipConfig {
            rotation_risk_max_minutes: 2000,
            rotation_risk_min_price: 6.0,
            ..ChipConfig::default()
        };
        let rec = ChipStrategy::new(loose).evaluate_free_hit(&ctx).unwrap();
        assert_eq!(rec.reasons, vec!["15 expensive rotation risks".to_string()]);
    }

    #[test]
    fn double_gameweek_detected_for_triple_captain() {
        let squad = squad();
        let mut preds = flat_predictions(3.0);
        preds.insert(13, 12.0);
        let lineup = select_lineup(&squad, &preds);
        // player 13 plays for team 4
        let fixtures = vec![fixture(1, 30, 4, 7, 2), fixture(2, 30, 8, 4, 2)];
        let ctx = ChipContext {
            squad: &squad,
            lineup: &lineup,
            predictions: &preds,
            fixtures: &fixtures,
            gameweek: 30,
        };
        let rec = ChipStrategy::new(ChipConfig::default())
            .evaluate_triple_captain(&ctx)
            .unwrap();
        assert!((rec.expected_benefit - 12.0).abs() < 1e-9);
        assert!((rec.confidence - (0.85 + 0.95 + 0.9) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn recommend_respects_minimum_benefit_and_usage() {
        let squad = squad();
        let preds = flat_predictions(2.0);
        let lineup = select_lineup(&squad, &preds);
        let fixtures = normal_week(12);
        let ctx = ChipContext {
            squad: &squad,
            lineup: &lineup,
            predictions: &preds,
            fixtures: &fixtures,
            gameweek: 12,
        };
        let strategy = ChipStrategy::new(ChipConfig::default());
        // bench worth 8 points, no triggers elsewhere clear their minimum
        assert!(strategy.recommend(&ctx, &ChipUsage::default()).is_none());

        let mut boosted = preds.clone();
        for p in &lineup.bench {
            boosted.insert(p.id(), 6.0);
        }
        let ctx = ChipContext { predictions: &boosted, ..ctx };
        let rec = strategy.recommend(&ctx, &ChipUsage::default()).unwrap();
        assert_eq!(rec.chip, Chip::BenchBoost);

        let mut usage = ChipUsage::default();
        usage.record(Chip::BenchBoost, 3);
        assert!(strategy.recommend(&ctx, &usage).is_none());
    }
}
