// Greedy selection used when the solver misses its time limit.
//
// Composition seeds go in first (elite and premium players, then the two
// goalkeeper tiers). The rest is picked by descending score, each pick only
// if the remaining slots can still be filled within budget and within the
// budget-player cap. The result is only returned if it passes every active
// rule.

use std::collections::HashMap;

use squadcast_core::squad::{MAX_PER_TEAM, SQUAD_SIZE};
use squadcast_core::{Position, TeamId};

use super::rules::{Candidate, SelectionRules};

struct GreedyState {
    selected: Vec<usize>,
    per_position: HashMap<Position, usize>,
    per_team: HashMap<TeamId, usize>,
    spent: u32,
    fodder: usize,
    regular: usize,
}

impl GreedyState {
    fn new() -> Self {
        Self {
            selected: Vec::with_capacity(SQUAD_SIZE),
            per_position: HashMap::new(),
            per_team: HashMap::new(),
            spent: 0,
            fodder: 0,
            regular: 0,
        }
    }

    fn position_count(&self, position: Position) -> usize {
        self.per_position.get(&position).copied().unwrap_or(0)
    }

    fn count_at_least(&self, candidates: &[Candidate], price: u32) -> usize {
        self.selected.iter().filter(|&&i| candidates[i].price >= price).count()
    }

    fn push(&mut self, idx: usize, c: &Candidate, rules: &SelectionRules) {
        self.selected.push(idx);
        *self.per_position.entry(c.position).or_insert(0) += 1;
        *self.per_team.entry(c.team).or_insert(0) += 1;
        self.spent += c.price;
        if c.price <= rules.fodder_price {
            self.fodder += 1;
        }
        if c.regular_starter {
            self.regular += 1;
        }
    }
}

/// Cheapest cost of filling every slot still open once `extra` is added,
/// using at most the budget players the cap leaves. Team caps are not
/// considered. `None` when the open slots cannot be filled at all.
fn cheapest_fill(
    candidates: &[Candidate],
    rules: &SelectionRules,
    state: &GreedyState,
    extra: usize,
) -> Option<u32> {
    let is_fodder = |c: &Candidate| c.price <= rules.fodder_price;
    let fodder_used = state.fodder + usize::from(is_fodder(&candidates[extra]));
    let fodder_left = rules.max_fodder.checked_sub(fodder_used)?;

    // best[k]: cheapest fill of the positions seen so far using k budget players
    let mut best: Vec<Option<u32>> = vec![None; fodder_left + 1];
    best[0] = Some(0);

    for position in Position::ALL {
        let extra_here = usize::from(candidates[extra].position == position);
        let open = position
            .squad_quota()
            .saturating_sub(state.position_count(position) + extra_here);

        let mut cheap = Vec::new();
        let mut others = Vec::new();
        for (i, c) in candidates.iter().enumerate() {
            if c.position != position || i == extra || state.selected.contains(&i) {
                continue;
            }
            if is_fodder(c) {
                cheap.push(c.price);
            } else {
                others.push(c.price);
            }
        }
        cheap.sort_unstable();
        others.sort_unstable();

        let mut next: Vec<Option<u32>> = vec![None; fodder_left + 1];
        for (used, cost) in best.iter().enumerate() {
            let Some(cost) = *cost else { continue };
            for f in 0..=open.min(cheap.len()).min(fodder_left - used) {
                if open - f > others.len() {
                    continue;
                }
                let fill = cost + cheap[..f].iter().sum::<u32>() + others[..open - f].iter().sum::<u32>();
                let slot = &mut next[used + f];
                if slot.map_or(true, |s| fill < s) {
                    *slot = Some(fill);
                }
            }
        }
        best = next;
    }

    best.into_iter().flatten().min()
}

fn try_add(candidates: &[Candidate], rules: &SelectionRules, state: &mut GreedyState, idx: usize) -> bool {
    let c = &candidates[idx];
    if state.selected.contains(&idx)
        || state.position_count(c.position) >= c.position.squad_quota()
        || state.per_team.get(&c.team).copied().unwrap_or(0) >= MAX_PER_TEAM
        || (c.price <= rules.fodder_price && state.fodder >= rules.max_fodder)
    {
        return false;
    }

    // leave enough slots for the regular starters still needed
    if let Some(min) = rules.min_regular_starters {
        let slots_after = SQUAD_SIZE - state.selected.len() - 1;
        if state.regular + usize::from(c.regular_starter) + slots_after < min {
            return false;
        }
    }

    match cheapest_fill(candidates, rules, state, idx) {
        Some(reserve) if state.spent + c.price + reserve <= rules.budget => {}
        _ => return false,
    }
    state.push(idx, c, rules);
    true
}

/// Greedy selection, or `None` if it cannot satisfy every rule.
pub(crate) fn greedy(candidates: &[Candidate], rules: &SelectionRules) -> Option<Vec<usize>> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        candidates[b]
            .score
            .partial_cmp(&candidates[a].score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(candidates[a].id.cmp(&candidates[b].id))
    });

    let mut state = GreedyState::new();

    // Best-scoring players above each price floor, elite first since they
    // also count as premiums.
    for rule in [rules.elite, rules.premiums].into_iter().flatten() {
        for &i in &order {
            if state.count_at_least(candidates, rule.price) >= rule.count {
                break;
            }
            if candidates[i].price >= rule.price {
                try_add(candidates, rules, &mut state, i);
            }
        }
    }

    if let Some((premium_gk, fodder_gk)) = rules.gk_split {
        let in_tier = |c: &Candidate, premium: bool| {
            if premium {
                c.price >= premium_gk
            } else {
                c.price <= fodder_gk
            }
        };
        for premium in [true, false] {
            let have = state
                .selected
                .iter()
                .any(|&i| candidates[i].position == Position::Goalkeeper && in_tier(&candidates[i], premium));
            if have {
                continue;
            }
            let keeper = order.iter().copied().find(|&i| {
                candidates[i].position == Position::Goalkeeper
                    && in_tier(&candidates[i], premium)
                    && !state.selected.contains(&i)
            });
            if let Some(i) = keeper {
                try_add(candidates, rules, &mut state, i);
            }
        }
    }

    for &idx in &order {
        if state.selected.len() == SQUAD_SIZE {
            break;
        }
        try_add(candidates, rules, &mut state, idx);
    }

    rules.check(candidates, &state.selected).ok()?;
    let mut selected = state.selected;
    selected.sort_unstable();
    Some(selected)
}
