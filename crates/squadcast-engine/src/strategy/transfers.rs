// Transfer suggestions: position-matched swaps ranked by predicted gain.

use std::collections::HashSet;

use tracing::debug;

use squadcast_core::config::TransferConfig;
use squadcast_core::squad::MAX_PER_TEAM;
use squadcast_core::{Availability, Player, PlayerId, Position, Squad, SquadError};

use crate::projection::Predictions;

/// One proposed swap.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferSuggestion {
    pub outgoing: Player,
    pub incoming: Player,
    /// Predicted points gained by the swap.
    pub gain: f64,
    /// Incoming minus outgoing price, in millions.
    pub price_change: f64,
    pub reason: String,
}

impl TransferSuggestion {
    pub fn position(&self) -> Position {
        self.outgoing.position()
    }
}

/// A set of transfers that can be made together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferPlan {
    pub transfers: Vec<TransferSuggestion>,
    /// Transfers beyond the free allowance.
    pub hits: u32,
    pub hit_cost: f64,
    /// Total gain minus hit cost.
    pub net_gain: f64,
}

#[derive(Debug, Clone)]
pub struct TransferEngine {
    config: TransferConfig,
}

impl TransferEngine {
    pub fn new(config: TransferConfig) -> Self {
        Self { config }
    }

    /// Prediction for `player`, defaulting to three games at their average.
    fn predicted(&self, player: &Player, predictions: &Predictions) -> f64 {
        predictions
            .get(&player.id())
            .copied()
            .unwrap_or(player.points_per_game * 3.0)
    }

    /// Best available non-squad players per position, by prediction.
    fn top_candidates<'a>(
        &self,
        squad: &Squad,
        pool: &'a [Player],
        predictions: &Predictions,
        position: Position,
    ) -> Vec<&'a Player> {
        let mut candidates: Vec<&Player> = pool
            .iter()
            .filter(|p| p.position() == position)
            .filter(|p| p.availability == Availability::Available)
            .filter(|p| !squad.contains(p.id()))
            .collect();
        candidates.sort_by(|a, b| {
            self.predicted(b, predictions)
                .partial_cmp(&self.predicted(a, predictions))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id().cmp(&b.id()))
        });
        candidates.truncate(self.config.candidates_per_position);
        candidates
    }

    /// Whether `incoming` could replace `outgoing` on price and team cap.
    fn is_legal_swap(&self, squad: &Squad, outgoing: &Player, incoming: &Player) -> bool {
        let bank = i64::from(squad.budget().tenths()) - i64::from(squad.spent().tenths());
        let price_change = i64::from(incoming.price().tenths()) - i64::from(outgoing.price().tenths());
        if price_change > bank {
            return false;
        }
        let same_team = squad
            .players()
            .iter()
            .filter(|p| p.id() != outgoing.id() && p.team == incoming.team)
            .count();
        same_team < MAX_PER_TEAM
    }

    /// Every affordable swap with a positive gain, best first.
    fn all_gains(&self, squad: &Squad, pool: &[Player], predictions: &Predictions) -> Vec<TransferSuggestion> {
        let mut suggestions = Vec::new();
        for position in Position::ALL {
            let candidates = self.top_candidates(squad, pool, predictions, position);
            for outgoing in squad.by_position(position) {
                let out_points = self.predicted(outgoing, predictions);
                for &incoming in &candidates {
                    if !self.is_legal_swap(squad, outgoing, incoming) {
                        continue;
                    }
                    let gain = self.predicted(incoming, predictions) - out_points;
                    if gain > 0.0 {
                        suggestions.push(TransferSuggestion {
                            outgoing: outgoing.clone(),
                            incoming: incoming.clone(),
                            gain,
                            price_change: incoming.price().diff_millions(outgoing.price()),
                            reason: format!("+{gain:.1} predicted points"),
                        });
                    }
                }
            }
        }
        suggestions.sort_by(|a, b| {
            b.gain
                .partial_cmp(&a.gain)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.outgoing.id().cmp(&b.outgoing.id()))
                .then(a.incoming.id().cmp(&b.incoming.id()))
        });
        suggestions
    }

    /// Ranked transfer suggestions.
    ///
    /// Within the free allowance a swap must gain at least `min_gain`; beyond
    /// it the gain net of the hit must. With `unlimited` (wildcard or free
    /// hit) every positive gain is kept.
    pub fn suggest_transfers(
        &self,
        squad: &Squad,
        pool: &[Player],
        predictions: &Predictions,
        free_transfers: u32,
        unlimited: bool,
    ) -> Vec<TransferSuggestion> {
        let all = self.all_gains(squad, pool, predictions);
        if unlimited {
            return all;
        }

        let free = free_transfers as usize;
        let max_hits = (self.config.max_hit_cost / self.config.hit_cost).floor().max(0.0) as usize;
        let limit = free + max_hits;

        let kept: Vec<TransferSuggestion> = all
            .into_iter()
            .enumerate()
            .filter(|(i, t)| {
                let net = if *i < free { t.gain } else { t.gain - self.config.hit_cost };
                net >= self.config.min_gain
            })
            .map(|(_, t)| t)
            .take(limit)
            .collect();
        debug!(suggestions = kept.len(), free_transfers, "transfer suggestions");
        kept
    }

    /// Pick a consistent subset of suggestions: each player moves at most
    /// once, and every swap must hold on the squad as it changes.
    pub fn select_transfers(
        &self,
        squad: &Squad,
        suggestions: &[TransferSuggestion],
        free_transfers: u32,
        unlimited: bool,
    ) -> TransferPlan {
        let mut simulated = squad.clone();
        let mut moved: HashSet<PlayerId> = HashSet::new();
        let mut transfers = Vec::new();

        for suggestion in suggestions {
            let out_id = suggestion.outgoing.id();
            let in_id = suggestion.incoming.id();
            if moved.contains(&out_id) || moved.contains(&in_id) {
                continue;
            }
            if simulated.swap(out_id, suggestion.incoming.clone()).is_err() {
                continue;
            }
            moved.insert(out_id);
            moved.insert(in_id);
            transfers.push(suggestion.clone());
        }

        let hits = if unlimited {
            0
        } else {
            (transfers.len() as u32).saturating_sub(free_transfers)
        };
        let hit_cost = f64::from(hits) * self.config.hit_cost;
        let net_gain = transfers.iter().map(|t| t.gain).sum::<f64>() - hit_cost;

        TransferPlan {
            transfers,
            hits,
            hit_cost,
            net_gain,
        }
    }

    /// Best affordable fit replacement for each squad player who is out or
    /// unlikely to play.
    pub fn injury_replacements(
        &self,
        squad: &Squad,
        pool: &[Player],
        predictions: &Predictions,
    ) -> Vec<TransferSuggestion> {
        let mut taken: HashSet<PlayerId> = HashSet::new();
        let mut replacements = Vec::new();

        for outgoing in squad.players() {
            let needs_cover = outgoing.availability == Availability::Unavailable
                || outgoing
                    .chance_of_playing
                    .is_some_and(|c| c < self.config.injury_threshold);
            if !needs_cover {
                continue;
            }

            let best = self
                .top_candidates(squad, pool, predictions, outgoing.position())
                .into_iter()
                .filter(|p| p.is_fully_fit() && !taken.contains(&p.id()))
                .find(|p| self.is_legal_swap(squad, outgoing, p));

            if let Some(incoming) = best {
                taken.insert(incoming.id());
                replacements.push(TransferSuggestion {
                    outgoing: outgoing.clone(),
                    incoming: incoming.clone(),
                    gain: self.predicted(incoming, predictions) - self.predicted(outgoing, predictions),
                    price_change: incoming.price().diff_millions(outgoing.price()),
                    reason: format!("replace unavailable {}", outgoing.name),
                });
            }
        }

        replacements
    }

    /// Apply a plan to `squad`, returning the players sold.
    pub fn apply_transfers(&self, squad: &mut Squad, plan: &TransferPlan) -> Result<Vec<Player>, SquadError> {
        let mut working = squad.clone();
        let mut sold = Vec::with_capacity(plan.transfers.len());
        for t in &plan.transfers {
            sold.push(working.swap(t.outgoing.id(), t.incoming.clone())?);
        }
        *squad = working;
        Ok(sold)
    }

    /// Free transfers available next gameweek.
    pub fn next_free_transfers(&self, current: u32, transfers_made: usize) -> u32 {
        if transfers_made == 0 {
            (current + 1).min(self.config.max_banked_transfers)
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squadcast_core::Price;
    use std::collections::HashMap;

    fn make(id: PlayerId, team: u32, position: Position, tenths: u32) -> Player {
        Player::new(id, format!("P{id}"), team, position, Price::from_tenths(tenths))
    }

    /// Squad of ids 1-15 (2/5/5/3) spending 90.0 of 100.0.
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
                players.push(make(id, id % 5 + 1, position, 60));
            }
        }
        Squad::new(players, Price::from_tenths(1000)).unwrap()
    }

    fn base_predictions() -> Predictions {
        (1..=15).map(|id| (id, 2.0)).collect()
    }

    fn engine() -> TransferEngine {
        TransferEngine::new(TransferConfig::default())
    }

    #[test]
    fn suggests_position_matched_upgrade() {
        let squad = squad();
        let pool = vec![make(100, 10, Position::Forward, 80), make(101, 11, Position::Midfielder, 60)];
        let mut preds = base_predictions();
        preds.insert(100, 7.0);
        preds.insert(101, 3.0);

        let suggestions = engine().suggest_transfers(&squad, &pool, &preds, 1, false);
        assert!(!suggestions.is_empty());
        let best = &suggestions[0];
        assert_eq!(best.incoming.id(), 100);
        assert_eq!(best.position(), Position::Forward);
        assert!((best.gain - 5.0).abs() < 1e-9);
        assert!((best.price_change - 2.0).abs() < 1e-9);
        // +1.0 midfield swap is below the minimum gain
        assert!(suggestions.iter().all(|s| s.incoming.id() != 101));
    }

    #[test]
    fn unaffordable_and_team_capped_swaps_excluded() {
        let squad = squad();
        // bank is 10.0: a 17.0 forward costs 11.0 more than any 6.0 forward
        let pricey = make(200, 10, Position::Forward, 170);
        // team 1 already has three players
        let capped = make(201, 1, Position::Forward, 60);
        let mut preds = base_predictions();
        preds.insert(200, 12.0);
        preds.insert(201, 12.0);

        let suggestions = engine().suggest_transfers(&squad, &[pricey, capped], &preds, 1, true);
        assert!(suggestions.iter().all(|s| s.incoming.id() != 200));
        // only forwards from team 1 may be swapped for another team 1 player
        assert!(suggestions
            .iter()
            .filter(|s| s.incoming.id() == 201)
            .all(|s| s.outgoing.team == 1));
    }

    #[test]
    fn hits_require_net_gain() {
        let squad = squad();
        let pool = vec![make(300, 10, Position::Forward, 60), make(301, 11, Position::Forward, 60)];
        let mut preds = base_predictions();
        preds.insert(300, 8.0); // gain 6
        preds.insert(301, 7.0); // gain 5, net of hit only 1

        let suggestions = engine().suggest_transfers(&squad, &pool, &preds, 1, false);
        assert!(suggestions.iter().all(|s| s.incoming.id() == 300));

        let wildcard = engine().suggest_transfers(&squad, &pool, &preds, 1, true);
        assert!(wildcard.iter().any(|s| s.incoming.id() == 301));
    }

    #[test]
    fn selection_dedupes_players_and_counts_hits() {
        let squad = squad();
        let pool = vec![make(300, 10, Position::Forward, 60), make(301, 11, Position::Forward, 60)];
        let mut preds = base_predictions();
        preds.insert(300, 8.0);
        preds.insert(301, 7.0);

        let eng = engine();
        let suggestions = eng.suggest_transfers(&squad, &pool, &preds, 1, true);
        let plan = eng.select_transfers(&squad, &suggestions, 1, false);
        assert_eq!(plan.transfers.len(), 2);
        let ins: HashSet<PlayerId> = plan.transfers.iter().map(|t| t.incoming.id()).collect();
        let outs: HashSet<PlayerId> = plan.transfers.iter().map(|t| t.outgoing.id()).collect();
        assert_eq!(ins.len(), 2);
        assert_eq!(outs.len(), 2);
        assert_eq!(plan.hits, 1);
        assert!((plan.net_gain - (6.0 + 5.0 - 4.0)).abs() < 1e-9);

        let mut applied = squad.clone();
        let sold = eng.apply_transfers(&mut applied, &plan).unwrap();
        assert_eq!(sold.len(), 2);
        assert!(applied.contains(300) && applied.contains(301));
    }

    #[test]
    fn injured_players_get_replacements() {
        let mut players = squad().into_players();
        players[3].availability = Availability::Unavailable;
        let injured_id = players[3].id();
        let squad = Squad::new(players, Price::from_tenths(1000)).unwrap();

        let mut doubtful = make(401, 12, Position::Defender, 55);
        doubtful.chance_of_playing = Some(50);
        let fit = make(400, 12, Position::Defender, 55);
        let mut preds: HashMap<PlayerId, f64> = base_predictions();
        preds.insert(400, 3.0);
        preds.insert(401, 9.0);

        let replacements = engine().injury_replacements(&squad, &[fit, doubtful], &preds);
        assert_eq!(replacements.len(), 1);
        assert_eq!(replacements[0].outgoing.id(), injured_id);
        assert_eq!(replacements[0].incoming.id(), 400);
    }

    #[test]
    fn free_transfer_banking() {
        let eng = engine();
        assert_eq!(eng.next_free_transfers(1, 0), 2);
        assert_eq!(eng.next_free_transfers(5, 0), 5);
        assert_eq!(eng.next_free_transfers(3, 2), 1);
    }
}
