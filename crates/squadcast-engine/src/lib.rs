// Scoring, squad optimization and gameweek strategy.

pub mod lineup;
pub mod optimizer;
pub mod projection;
pub mod scoring;
pub mod strategy;

pub use lineup::{select_lineup, Lineup};
pub use optimizer::{optimize_squad, OptimizeError, SolveStatus, SquadOptimizer, SquadSolution};
pub use projection::Predictions;
pub use scoring::{PlayerScore, ScoredPlayer, ScoringContext, ScoringModel};
