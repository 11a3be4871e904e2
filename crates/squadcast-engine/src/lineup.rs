// Starting eleven, formation and bench order for a squad.

use std::cmp::Ordering;
use std::collections::HashMap;

use squadcast_core::{Formation, Player, PlayerId, Position, Squad};

use crate::optimizer::best_formation;

/// Chosen starters, bench and formation for one gameweek.
#[derive(Debug, Clone, PartialEq)]
pub struct Lineup {
    /// Goalkeeper first, then defenders, midfielders and forwards.
    pub starters: Vec<Player>,
    /// Outfield substitutes by priority, backup goalkeeper last.
    pub bench: Vec<Player>,
    pub formation: Formation,
    pub projected_points: f64,
}

impl Lineup {
    pub fn goalkeeper(&self) -> Option<&Player> {
        self.starters.first()
    }

    pub fn starter_ids(&self) -> Vec<PlayerId> {
        self.starters.iter().map(Player::id).collect()
    }

    pub fn bench_ids(&self) -> Vec<PlayerId> {
        self.bench.iter().map(Player::id).collect()
    }

    pub fn is_starting(&self, id: PlayerId) -> bool {
        self.starters.iter().any(|p| p.id() == id)
    }
}

fn prediction(predictions: &HashMap<PlayerId, f64>, id: PlayerId) -> f64 {
    predictions
        .get(&id)
        .copied()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Prediction descending, then id ascending.
fn by_prediction<'a>(
    predictions: &'a HashMap<PlayerId, f64>,
) -> impl Fn(&&Player, &&Player) -> Ordering + 'a {
    move |a, b| {
        prediction(predictions, b.id())
            .partial_cmp(&prediction(predictions, a.id()))
            .unwrap_or(Ordering::Equal)
            .then(a.id().cmp(&b.id()))
    }
}

/// Pick the eleven with the highest predicted points in a valid formation.
///
/// Players without a prediction count as zero.
pub fn select_lineup(squad: &Squad, predictions: &HashMap<PlayerId, f64>) -> Lineup {
    let mut by_position: HashMap<Position, Vec<&Player>> = HashMap::new();
    for player in squad.players() {
        by_position.entry(player.position()).or_default().push(player);
    }
    for players in by_position.values_mut() {
        players.sort_by(by_prediction(predictions));
    }

    let ranked: HashMap<Position, Vec<f64>> = by_position
        .iter()
        .map(|(&pos, players)| {
            let values = players.iter().map(|p| prediction(predictions, p.id())).collect();
            (pos, values)
        })
        .collect();
    let formation = best_formation(&ranked).map_or_else(Formation::default, |(f, _)| f);

    let mut starters: Vec<Player> = Vec::with_capacity(11);
    let mut outfield_bench: Vec<&Player> = Vec::new();
    let mut backup_keepers: Vec<&Player> = Vec::new();

    for position in Position::ALL {
        let players = by_position.remove(&position).unwrap_or_default();
        let slots = formation.slots(position);
        for (i, player) in players.into_iter().enumerate() {
            if i < slots {
                starters.push(player.clone());
            } else if position == Position::Goalkeeper {
                backup_keepers.push(player);
            } else {
                outfield_bench.push(player);
            }
        }
    }

    outfield_bench.sort_by(by_prediction(predictions));
    let bench: Vec<Player> = outfield_bench
        .into_iter()
        .chain(backup_keepers)
        .cloned()
        .collect();

    let projected_points = starters.iter().map(|p| prediction(predictions, p.id())).sum();

    Lineup {
        starters,
        bench,
        formation,
        projected_points,
    }
}
