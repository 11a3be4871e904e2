// Selection rules resolved against a concrete candidate pool.
//
// Some rules only make sense when the pool can satisfy them (enough regular
// starters, enough premiums, both goalkeeper price tiers). Those are switched
// off here, before the model is built, rather than letting the solver report
// an infeasible problem.

use std::collections::{BTreeMap, HashSet};

use tracing::info;

use squadcast_core::config::OptimizerConfig;
use squadcast_core::squad::{MAX_PER_TEAM, SQUAD_SIZE};
use squadcast_core::{Player, PlayerId, Position, Price, TeamId};

/// The optimizer's view of one candidate.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub id: PlayerId,
    pub position: Position,
    pub team: TeamId,
    pub price: u32,
    pub score: f64,
    pub regular_starter: bool,
}

impl Candidate {
    pub fn new(player: &Player, score: f64, config: &OptimizerConfig) -> Self {
        Self {
            id: player.id(),
            position: player.position(),
            team: player.team,
            price: player.price().tenths(),
            score: if score.is_finite() { score } else { 0.0 },
            regular_starter: player.stats.minutes > config.regular_starter_min_minutes
                && player.is_fully_fit(),
        }
    }
}

/// A lower bound on how many of a class must be picked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MinPriced {
    pub price: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SelectionRules {
    pub budget: u32,
    pub min_regular_starters: Option<usize>,
    pub premiums: Option<MinPriced>,
    pub elite: Option<MinPriced>,
    pub fodder_price: u32,
    pub max_fodder: usize,
    /// (premium floor, fodder ceiling) for the two goalkeepers.
    pub gk_split: Option<(u32, u32)>,
}

impl SelectionRules {
    pub fn resolve(config: &OptimizerConfig, budget: Price, candidates: &[Candidate]) -> Self {
        let regular = candidates.iter().filter(|c| c.regular_starter).count();
        let min_regular_starters = if config.min_regular_starters == 0 {
            None
        } else if regular >= config.min_regular_starters {
            Some(config.min_regular_starters)
        } else {
            info!(
                regular,
                required = config.min_regular_starters,
                "too few regular starters in pool, dropping starter rule"
            );
            None
        };

        let premiums = min_priced(candidates, config.premium_price, config.min_premiums, "premium");
        let elite = min_priced(
            candidates,
            config.elite_premium_price,
            config.min_elite_premiums,
            "elite premium",
        );

        let premium_gk = Price::from_millions(config.premium_gk_price).tenths();
        let fodder_gk = Price::from_millions(config.fodder_gk_price).tenths();
        let keepers = || candidates.iter().filter(|c| c.position == Position::Goalkeeper);
        let has_premium_gk = keepers().any(|c| c.price >= premium_gk);
        let has_fodder_gk = keepers().any(|c| c.price <= fodder_gk);
        let gk_split = if has_premium_gk && has_fodder_gk {
            Some((premium_gk, fodder_gk))
        } else {
            info!("goalkeeper price tiers not both present, dropping goalkeeper split");
            None
        };

        Self {
            budget: budget.tenths(),
            min_regular_starters,
            premiums,
            elite,
            fodder_price: Price::from_millions(config.fodder_price).tenths(),
            max_fodder: config.max_fodder,
            gk_split,
        }
    }

    /// Check a finished selection against every active rule.
    pub fn check(&self, candidates: &[Candidate], selected: &[usize]) -> Result<(), String> {
        let picked: Vec<&Candidate> = selected.iter().map(|&i| &candidates[i]).collect();

        if picked.len() != SQUAD_SIZE {
            return Err(format!("selected {} players, need {SQUAD_SIZE}", picked.len()));
        }
        let unique: HashSet<PlayerId> = picked.iter().map(|c| c.id).collect();
        if unique.len() != SQUAD_SIZE {
            return Err("selection contains duplicate players".into());
        }

        let spent: u32 = picked.iter().map(|c| c.price).sum();
        if spent > self.budget {
            return Err(format!("spend {spent} exceeds budget {} (tenths)", self.budget));
        }

        for position in Position::ALL {
            let n = picked.iter().filter(|c| c.position == position).count();
            if n != position.squad_quota() {
                return Err(format!("{n} {position} selected, need {}", position.squad_quota()));
            }
        }

        let mut per_team: BTreeMap<TeamId, usize> = BTreeMap::new();
        for c in &picked {
            *per_team.entry(c.team).or_insert(0) += 1;
        }
        if let Some((team, n)) = per_team.into_iter().find(|&(_, n)| n > MAX_PER_TEAM) {
            return Err(format!("{n} players from team {team}"));
        }

        if let Some(min) = self.min_regular_starters {
            let n = picked.iter().filter(|c| c.regular_starter).count();
            if n < min {
                return Err(format!("{n} regular starters, need {min}"));
            }
        }
        for (rule, label) in [(self.premiums, "premium"), (self.elite, "elite premium")] {
            if let Some(rule) = rule {
                let n = picked.iter().filter(|c| c.price >= rule.price).count();
                if n < rule.count {
                    return Err(format!("{n} {label} players, need {}", rule.count));
                }
            }
        }

        let fodder = picked.iter().filter(|c| c.price <= self.fodder_price).count();
        if fodder > self.max_fodder {
            return Err(format!("{fodder} budget players, max {}", self.max_fodder));
        }

        if let Some((premium_gk, fodder_gk)) = self.gk_split {
            let keepers: Vec<&&Candidate> = picked
                .iter()
                .filter(|c| c.position == Position::Goalkeeper)
                .collect();
            if !keepers.iter().any(|c| c.price >= premium_gk) {
                return Err("no goalkeeper in the premium tier".into());
            }
            if !keepers.iter().any(|c| c.price <= fodder_gk) {
                return Err("no goalkeeper in the budget tier".into());
            }
        }

        Ok(())
    }
}

fn min_priced(
    candidates: &[Candidate],
    price_millions: f64,
    count: usize,
    label: &str,
) -> Option<MinPriced> {
    if count == 0 {
        return None;
    }
    let price = Price::from_millions(price_millions).tenths();
    let available = candidates.iter().filter(|c| c.price >= price).count();
    if available >= count {
        Some(MinPriced { price, count })
    } else {
        info!(available, required = count, "too few {label} players in pool, dropping rule");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: PlayerId, position: Position, team: TeamId, price: u32) -> Candidate {
        Candidate {
            id,
            position,
            team,
            price,
            score: 1.0,
            regular_starter: true,
        }
    }

    #[test]
    fn soft_rules_drop_when_pool_lacks_candidates() {
        let pool = vec![
            candidate(1, Position::Goalkeeper, 1, 50),
            candidate(2, Position::Goalkeeper, 2, 50),
            candidate(3, Position::Forward, 3, 110),
        ];
        let rules = SelectionRules::resolve(&OptimizerConfig::default(), Price::from_tenths(1000), &pool);
        assert_eq!(rules.min_regular_starters, None);
        assert_eq!(rules.premiums, None);
        assert_eq!(rules.gk_split, None);
        assert_eq!(rules.fodder_price, 45);
    }

    #[test]
    fn rules_stay_active_when_satisfiable() {
        let mut pool: Vec<Candidate> = (1..=12)
            .map(|i| candidate(i, Position::Midfielder, i, 60))
            .collect();
        pool.push(candidate(20, Position::Goalkeeper, 1, 50));
        pool.push(candidate(21, Position::Goalkeeper, 2, 40));
        pool.push(candidate(22, Position::Forward, 3, 120));
        pool.push(candidate(23, Position::Forward, 4, 105));
        let rules = SelectionRules::resolve(&OptimizerConfig::default(), Price::from_tenths(1000), &pool);
        assert_eq!(rules.min_regular_starters, Some(11));
        assert_eq!(rules.premiums, Some(MinPriced { price: 100, count: 2 }));
        assert_eq!(rules.gk_split, Some((45, 40)));
        assert_eq!(rules.elite, None);
    }

    #[test]
    fn check_reports_team_violation() {
        let mut pool = Vec::new();
        let layout = [
            (Position::Goalkeeper, 2),
            (Position::Defender, 5),
            (Position::Midfielder, 5),
            (Position::Forward, 3),
        ];
        let mut id = 0;
        for (position, n) in layout {
            for _ in 0..n {
                id += 1;
                let team = if id <= 4 { 1 } else { id };
                pool.push(candidate(id, position, team, 60));
            }
        }
        let rules = SelectionRules {
            budget: 1000,
            min_regular_starters: None,
            premiums: None,
            elite: None,
            fodder_price: 45,
            max_fodder: 3,
            gk_split: None,
        };
        let all: Vec<usize> = (0..pool.len()).collect();
        let err = rules.check(&pool, &all).unwrap_err();
        assert!(err.contains("team 1"), "{err}");
    }
}
