// Player scoring model.
//
// Every player gets the full set of sub-scores, each clamped to [0, 100].
// The total is the weighted sum over the configured weight vector, so
// weights act as plain multipliers and need not sum to one.

pub mod historical;
pub mod set_pieces;
pub mod signals;

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use squadcast_core::config::{ScoringParams, StrategyConfig};
use squadcast_core::fixture::rank_by_strength;
use squadcast_core::{Fixture, Player, PlayerHistory, PlayerId, SubScore, Team, TeamId, WeightVector};

use self::set_pieces::SetPieceTable;

/// Clamp a sub-score into [0, 100]. NaN and infinities become 0.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Context and results
// ---------------------------------------------------------------------------

/// Run-wide data the sub-scores draw on beyond the player record itself.
#[derive(Debug, Clone, Default)]
pub struct ScoringContext {
    pub fixtures: Vec<Fixture>,
    /// Team ids strongest first.
    pub team_ranking: Vec<TeamId>,
    pub histories: HashMap<PlayerId, PlayerHistory>,
    pub set_pieces: SetPieceTable,
}

impl ScoringContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixtures(mut self, fixtures: Vec<Fixture>) -> Self {
        self.fixtures = fixtures;
        self
    }

    pub fn with_teams(mut self, teams: &[Team]) -> Self {
        self.team_ranking = rank_by_strength(teams);
        self
    }

    pub fn with_histories(mut self, histories: HashMap<PlayerId, PlayerHistory>) -> Self {
        self.histories = histories;
        self
    }

    pub fn with_set_pieces(mut self, table: SetPieceTable) -> Self {
        self.set_pieces = table;
        self
    }

    pub fn history(&self, id: PlayerId) -> Option<&PlayerHistory> {
        self.histories.get(&id)
    }
}

/// Sub-scores and weighted total for one player in one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerScore {
    pub player_id: PlayerId,
    pub components: BTreeMap<SubScore, f64>,
    pub total: f64,
}

impl PlayerScore {
    pub fn component(&self, key: SubScore) -> f64 {
        self.components.get(&key).copied().unwrap_or(0.0)
    }
}

/// A player paired with its score, the optimizer's input unit.
#[derive(Debug, Clone)]
pub struct ScoredPlayer {
    pub player: Player,
    pub score: PlayerScore,
}

impl ScoredPlayer {
    pub fn total(&self) -> f64 {
        self.score.total
    }
}

// ---------------------------------------------------------------------------
// ScoringModel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ScoringModel {
    weights: WeightVector,
    params: ScoringParams,
}

impl ScoringModel {
    pub fn new(weights: WeightVector, params: ScoringParams) -> Self {
        Self { weights, params }
    }

    pub fn from_strategy(strategy: &StrategyConfig) -> Self {
        Self::new(strategy.weights.clone(), strategy.params.clone())
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn params(&self) -> &ScoringParams {
        &self.params
    }

    /// Every sub-score for `player`.
    pub fn sub_scores(&self, player: &Player, ctx: &ScoringContext) -> BTreeMap<SubScore, f64> {
        let history = ctx.history(player.id());
        let params = &self.params;

        SubScore::ALL
            .into_iter()
            .map(|key| {
                let value = match key {
                    SubScore::Historical => historical::historical_score(player, history, params),
                    SubScore::Form => signals::form_score(player, params),
                    SubScore::Fixtures => signals::fixture_score(player, &ctx.fixtures, params),
                    SubScore::Value => signals::value_score(player, history, params),
                    SubScore::Ownership => signals::ownership_score(player),
                    SubScore::Expected => signals::expected_score(player),
                    SubScore::Consistency => historical::consistency_score(player, history, params),
                    SubScore::Elite => historical::elite_score(history),
                    SubScore::SetPieces => {
                        set_pieces::set_piece_score(player, history, &ctx.set_pieces)
                    }
                    SubScore::TeamQuality => {
                        signals::team_quality_score(player.team, &ctx.team_ranking)
                    }
                };
                (key, clamp_score(value))
            })
            .collect()
    }

    /// Weighted sum of the components. Keys with weight 0 contribute nothing.
    pub fn combine(&self, components: &BTreeMap<SubScore, f64>) -> f64 {
        self.weights
            .iter()
            .filter(|&(_, w)| w > 0.0)
            .map(|(key, w)| w * components.get(&key).copied().unwrap_or(0.0))
            .sum()
    }

    pub fn score(&self, player: &Player, ctx: &ScoringContext) -> PlayerScore {
        let components = self.sub_scores(player, ctx);
        let total = self.combine(&components);
        PlayerScore {
            player_id: player.id(),
            components,
            total,
        }
    }

    /// Score a pool, keeping input order.
    pub fn score_all(&self, players: &[Player], ctx: &ScoringContext) -> Vec<ScoredPlayer> {
        let scored: Vec<ScoredPlayer> = players
            .iter()
            .map(|p| ScoredPlayer {
                score: self.score(p, ctx),
                player: p.clone(),
            })
            .collect();
        debug!(players = scored.len(), "scored player pool");
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squadcast_core::{Position, Price, SeasonSummary};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn sample_player() -> Player {
        let mut p = Player::new(10, "Sample", 3, Position::Midfielder, Price::from_tenths(75));
        p.form = 6.2;
        p.points_per_game = 5.1;
        p.ownership = 14.0;
        p.stats.total_points = 120;
        p.stats.minutes = 1800;
        p.expected.goals = 6.0;
        p.expected.assists = 4.0;
        p
    }

    fn sample_context() -> ScoringContext {
        let mut histories = HashMap::new();
        histories.insert(
            10,
            PlayerHistory::new(vec![SeasonSummary {
                season: "2024/25".into(),
                total_points: 170,
                minutes: 2900,
                ..Default::default()
            }]),
        );
        ScoringContext::new().with_histories(histories)
    }

    #[test]
    fn clamp_handles_nan_and_range() {
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(f64::INFINITY), 0.0);
        assert_eq!(clamp_score(-3.0), 0.0);
        assert_eq!(clamp_score(140.0), 100.0);
        assert_eq!(clamp_score(42.5), 42.5);
    }

    #[test]
    fn single_weight_total_equals_that_sub_score() {
        let player = sample_player();
        let ctx = sample_context();
        for key in SubScore::ALL {
            let model = ScoringModel::new(WeightVector::single(key), ScoringParams::default());
            let score = model.score(&player, &ctx);
            assert!(
                approx_eq(score.total, score.component(key), 1e-12),
                "{key}: total {} vs component {}",
                score.total,
                score.component(key)
            );
        }
    }

    #[test]
    fn total_is_weighted_sum() {
        let player = sample_player();
        let ctx = sample_context();
        let weights = WeightVector::new()
            .with(SubScore::Form, 2.0)
            .with(SubScore::Value, 0.5)
            .with(SubScore::Elite, 0.0);
        let model = ScoringModel::new(weights, ScoringParams::default());
        let score = model.score(&player, &ctx);
        let expected = 2.0 * score.component(SubScore::Form) + 0.5 * score.component(SubScore::Value);
        assert!(approx_eq(score.total, expected, 1e-9));
    }

    #[test]
    fn blank_player_scores_within_range() {
        let blank = Player::new(1, "", 0, Position::Goalkeeper, Price::ZERO);
        let model = ScoringModel::new(
            squadcast_core::ScoringPreset::Preseason.weights(),
            ScoringParams::default(),
        );
        let score = model.score(&blank, &ScoringContext::new());
        for (key, value) in &score.components {
            assert!((0.0..=100.0).contains(value), "{key} = {value}");
        }
        assert!(score.total.is_finite());
        assert_eq!(score.component(SubScore::Fixtures), 50.0);
        assert!(score.component(SubScore::Historical) <= 25.0);
    }

    #[test]
    fn score_all_keeps_order() {
        let base = sample_player();
        let second = Player::new(11, "Other", base.team, base.position(), base.price());
        let players = vec![base, second];
        let model = ScoringModel::new(
            squadcast_core::ScoringPreset::Historical.weights(),
            ScoringParams::default(),
        );
        let scored = model.score_all(&players, &sample_context());
        let ids: Vec<PlayerId> = scored.iter().map(|s| s.player.id()).collect();
        assert_eq!(ids, vec![10, 11]);
        assert!(scored[0].total() > scored[1].total());
    }
}
