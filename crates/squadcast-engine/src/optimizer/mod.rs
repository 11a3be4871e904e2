// Squad optimizer: pick the 15 players that maximize total score under the
// budget, positional, per-team and composition rules.
//
// The integer program runs on a dedicated thread bounded by the configured
// time limit. If the limit passes, a greedy selection is tried instead and
// the result is marked as time-limited.

mod fallback;
pub mod formation;
mod model;
mod rules;

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use squadcast_core::config::OptimizerConfig;
use squadcast_core::{Player, Position, Price, Squad};

use crate::scoring::{ScoredPlayer, ScoringContext, ScoringModel};

use self::rules::{Candidate, SelectionRules};

pub use self::formation::{best_formation, suggest_formation};

// ---------------------------------------------------------------------------
// Error and result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    #[error("candidate pool is empty")]
    EmptyPool,

    #[error("no valid squad: {reason}")]
    Infeasible { reason: String },

    #[error("solver did not finish within {limit:?} and no fallback squad satisfied the rules")]
    TimedOut { limit: Duration },

    #[error("solver failed: {0}")]
    Solver(String),

    #[error("solver returned an invalid squad: {0}")]
    InvalidSolution(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Proven optimal by the solver.
    Optimal,
    /// Greedy selection after the time limit passed; valid but maybe
    /// suboptimal.
    ///
    /// The solver thread cannot be interrupted. It runs to completion in the
    /// background and its late result is discarded.
    TimeLimited,
}

#[derive(Debug, Clone)]
pub struct SquadSolution {
    pub squad: Squad,
    /// Scores of the selected players, in squad order.
    pub scored: Vec<ScoredPlayer>,
    pub status: SolveStatus,
    /// Sum of the selected players' totals.
    pub objective: f64,
}

// ---------------------------------------------------------------------------
// SquadOptimizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SquadOptimizer {
    config: OptimizerConfig,
}

impl SquadOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Select a squad from scored candidates.
    ///
    /// Candidates are ordered by id before the model is built, so the same
    /// pool always yields the same squad whatever order it arrives in.
    /// Duplicate ids keep their first occurrence.
    pub fn optimize(&self, pool: &[ScoredPlayer], budget: Price) -> Result<SquadSolution, OptimizeError> {
        if pool.is_empty() {
            return Err(OptimizeError::EmptyPool);
        }

        let mut ordered: Vec<&ScoredPlayer> = pool.iter().collect();
        ordered.sort_by_key(|sp| sp.player.id());
        let mut seen = HashSet::new();
        ordered.retain(|sp| seen.insert(sp.player.id()));

        let candidates: Vec<Candidate> = ordered
            .iter()
            .map(|sp| Candidate::new(&sp.player, sp.total(), &self.config))
            .collect();

        precheck(&candidates, budget)?;
        let rules = SelectionRules::resolve(&self.config, budget, &candidates);
        debug!(?rules, candidates = candidates.len(), "selection rules resolved");

        let (selected, status) = solve_within(candidates.clone(), rules.clone(), self.config.time_limit())?;

        rules
            .check(&candidates, &selected)
            .map_err(OptimizeError::InvalidSolution)?;

        let scored: Vec<ScoredPlayer> = selected.iter().map(|&i| ordered[i].clone()).collect();
        let objective = scored.iter().map(ScoredPlayer::total).sum();
        let players: Vec<Player> = scored.iter().map(|sp| sp.player.clone()).collect();

        let mut squad =
            Squad::new(players, budget).map_err(|e| OptimizeError::InvalidSolution(e.to_string()))?;
        squad
            .set_formation(suggest_formation(&scored))
            .map_err(|e| OptimizeError::InvalidSolution(e.to_string()))?;

        info!(
            status = ?status,
            objective,
            spent = %squad.spent(),
            formation = %squad.formation(),
            "squad selected"
        );

        Ok(SquadSolution {
            squad,
            scored,
            status,
            objective,
        })
    }
}

/// Score `candidates` and select a squad in one call.
pub fn optimize_squad(
    candidates: &[Player],
    model: &ScoringModel,
    ctx: &ScoringContext,
    budget: Price,
    config: &OptimizerConfig,
) -> Result<SquadSolution, OptimizeError> {
    let scored = model.score_all(candidates, ctx);
    SquadOptimizer::new(config.clone()).optimize(&scored, budget)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Cheap infeasibility checks that give clearer reasons than the solver.
fn precheck(candidates: &[Candidate], budget: Price) -> Result<(), OptimizeError> {
    let mut by_position: HashMap<Position, Vec<u32>> = HashMap::new();
    for c in candidates {
        by_position.entry(c.position).or_default().push(c.price);
    }

    let mut cheapest = 0u32;
    for position in Position::ALL {
        let mut prices = by_position.remove(&position).unwrap_or_default();
        let quota = position.squad_quota();
        if prices.len() < quota {
            return Err(OptimizeError::Infeasible {
                reason: format!("only {} {position} candidates, need {quota}", prices.len()),
            });
        }
        prices.sort_unstable();
        cheapest += prices[..quota].iter().sum::<u32>();
    }

    if cheapest > budget.tenths() {
        return Err(OptimizeError::Infeasible {
            reason: format!(
                "cheapest possible squad costs {}, budget is {budget}",
                Price::from_tenths(cheapest)
            ),
        });
    }

    Ok(())
}

/// Run the solver on its own thread, falling back to the greedy pick when
/// `limit` passes first. A zero limit skips the solver.
fn solve_within(
    candidates: Vec<Candidate>,
    rules: SelectionRules,
    limit: Duration,
) -> Result<(Vec<usize>, SolveStatus), OptimizeError> {
    let time_limited = |candidates: &[Candidate], rules: &SelectionRules| {
        fallback::greedy(candidates, rules)
            .map(|selected| (selected, SolveStatus::TimeLimited))
            .ok_or(OptimizeError::TimedOut { limit })
    };

    if limit.is_zero() {
        debug!("no time for the solver, using greedy selection");
        return time_limited(&candidates, &rules);
    }

    let (tx, rx) = mpsc::channel();
    let worker_candidates = candidates.clone();
    let worker_rules = rules.clone();

    // Detached: on timeout the worker finishes on its own and the send fails.
    thread::Builder::new()
        .name("squad-solver".into())
        .spawn(move || {
            let _ = tx.send(model::solve(&worker_candidates, &worker_rules));
        })
        .map_err(|e| OptimizeError::Solver(format!("failed to start solver thread: {e}")))?;

    match rx.recv_timeout(limit) {
        Ok(result) => result.map(|selected| (selected, SolveStatus::Optimal)),
        Err(RecvTimeoutError::Timeout) => {
            warn!(?limit, "solver hit time limit, trying greedy selection");
            time_limited(&candidates, &rules)
        }
        Err(RecvTimeoutError::Disconnected) => Err(OptimizeError::Solver(
            "solver thread exited without a result".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::PlayerScore;
    use std::collections::BTreeMap;

    fn scored(id: u32, position: Position, team: u32, tenths: u32, total: f64) -> ScoredPlayer {
        let mut player = Player::new(id, format!("P{id}"), team, position, Price::from_tenths(tenths));
        player.stats.minutes = 2000;
        ScoredPlayer {
            player,
            score: PlayerScore {
                player_id: id,
                components: BTreeMap::new(),
                total,
            },
        }
    }

    #[test]
    fn empty_pool_is_an_error() {
        let optimizer = SquadOptimizer::new(OptimizerConfig::default());
        assert_eq!(
            optimizer.optimize(&[], Price::from_tenths(1000)).unwrap_err(),
            OptimizeError::EmptyPool
        );
    }

    #[test]
    fn missing_position_is_infeasible() {
        let pool: Vec<ScoredPlayer> = (1..=20)
            .map(|i| scored(i, Position::Midfielder, i, 50, 1.0))
            .collect();
        let optimizer = SquadOptimizer::new(OptimizerConfig::default());
        match optimizer.optimize(&pool, Price::from_tenths(1000)) {
            Err(OptimizeError::Infeasible { reason }) => assert!(reason.contains("GK"), "{reason}"),
            other => panic!("expected Infeasible, got {other:?}"),
        }
    }

    #[test]
    fn cheapest_squad_over_budget_is_infeasible() {
        let layout = [
            (Position::Goalkeeper, 2),
            (Position::Defender, 5),
            (Position::Midfielder, 5),
            (Position::Forward, 3),
        ];
        let mut pool = Vec::new();
        let mut id = 0;
        for (position, n) in layout {
            for _ in 0..n {
                id += 1;
                pool.push(scored(id, position, id, 70, 10.0));
            }
        }
        let optimizer = SquadOptimizer::new(OptimizerConfig::default());
        match optimizer.optimize(&pool, Price::from_tenths(1000)) {
            Err(OptimizeError::Infeasible { reason }) => assert!(reason.contains("£105.0m"), "{reason}"),
            other => panic!("expected Infeasible, got {other:?}"),
        }
    }
}
