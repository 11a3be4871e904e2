// 0/1 integer program for squad selection, solved with good_lp's pure-Rust
// microlp backend.

use std::collections::BTreeSet;

use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};

use squadcast_core::squad::{MAX_PER_TEAM, SQUAD_SIZE};
use squadcast_core::{Position, TeamId};

use super::rules::{Candidate, SelectionRules};
use super::OptimizeError;

/// Sum of the pick variables whose candidate matches `pred`.
fn count_where(
    candidates: &[Candidate],
    picks: &[Variable],
    pred: impl Fn(&Candidate) -> bool,
) -> Expression {
    candidates
        .iter()
        .zip(picks)
        .filter(|(c, _)| pred(c))
        .map(|(_, &x)| 1.0 * x)
        .sum()
}

/// Solve the selection problem. Returns indices into `candidates`.
pub(crate) fn solve(
    candidates: &[Candidate],
    rules: &SelectionRules,
) -> Result<Vec<usize>, OptimizeError> {
    let mut vars = ProblemVariables::new();
    let picks: Vec<Variable> = candidates
        .iter()
        .map(|_| vars.add(variable().binary()))
        .collect();

    let objective: Expression = candidates
        .iter()
        .zip(&picks)
        .map(|(c, &x)| c.score * x)
        .sum();

    let mut model = vars.maximise(objective).using(microlp);

    // Squad size
    let squad_size = count_where(candidates, &picks, |_| true);
    let size = SQUAD_SIZE as f64;
    model = model.with(constraint!(squad_size == size));

    // Budget, in tenths so the comparison is exact
    let spend: Expression = candidates
        .iter()
        .zip(&picks)
        .map(|(c, &x)| f64::from(c.price) * x)
        .sum();
    let budget = f64::from(rules.budget);
    model = model.with(constraint!(spend <= budget));

    // Positional quotas
    for position in Position::ALL {
        let selected = count_where(candidates, &picks, |c| c.position == position);
        let quota = position.squad_quota() as f64;
        model = model.with(constraint!(selected == quota));
    }

    // Per-team cap
    let teams: BTreeSet<TeamId> = candidates.iter().map(|c| c.team).collect();
    let team_cap = MAX_PER_TEAM as f64;
    for team in teams {
        let from_team = count_where(candidates, &picks, |c| c.team == team);
        model = model.with(constraint!(from_team <= team_cap));
    }

    if let Some(min) = rules.min_regular_starters {
        let starters = count_where(candidates, &picks, |c| c.regular_starter);
        let min = min as f64;
        model = model.with(constraint!(starters >= min));
    }

    for rule in [rules.premiums, rules.elite].into_iter().flatten() {
        let priced = count_where(candidates, &picks, |c| c.price >= rule.price);
        let min = rule.count as f64;
        model = model.with(constraint!(priced >= min));
    }

    let fodder = count_where(candidates, &picks, |c| c.price <= rules.fodder_price);
    let max_fodder = rules.max_fodder as f64;
    model = model.with(constraint!(fodder <= max_fodder));

    if let Some((premium_gk, fodder_gk)) = rules.gk_split {
        let premium = count_where(candidates, &picks, |c| {
            c.position == Position::Goalkeeper && c.price >= premium_gk
        });
        let budget_gk = count_where(candidates, &picks, |c| {
            c.position == Position::Goalkeeper && c.price <= fodder_gk
        });
        model = model.with(constraint!(premium >= 1.0));
        model = model.with(constraint!(budget_gk >= 1.0));
    }

    let solution = model.solve().map_err(|e| match e {
        ResolutionError::Infeasible => OptimizeError::Infeasible {
            reason: "no squad satisfies every constraint".into(),
        },
        other => OptimizeError::Solver(other.to_string()),
    })?;

    Ok(picks
        .iter()
        .enumerate()
        .filter(|(_, &x)| solution.value(x) > 0.5)
        .map(|(i, _)| i)
        .collect())
}
