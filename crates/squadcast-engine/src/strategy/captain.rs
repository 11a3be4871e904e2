// Captain and vice-captain selection.

use serde::Serialize;

use squadcast_core::config::CaptainConfig;
use squadcast_core::fixture::fixtures_in_gameweek;
use squadcast_core::{Fixture, Player, PlayerId, Position, Price};

use crate::projection::Predictions;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptainChoice {
    pub player_id: PlayerId,
    pub name: String,
    pub predicted_points: f64,
    /// Mean of the supporting factors, in [0, 1].
    pub confidence: f64,
    pub ownership: f64,
    pub is_differential: bool,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptaincyPick {
    pub captain: CaptainChoice,
    pub vice_captain: Option<CaptainChoice>,
    pub triple_captain: bool,
}

#[derive(Debug, Clone)]
pub struct CaptainSelector {
    config: CaptainConfig,
}

impl CaptainSelector {
    pub fn new(config: CaptainConfig) -> Self {
        Self { config }
    }

    fn evaluate(
        &self,
        player: &Player,
        predictions: &Predictions,
        fixtures: &[Fixture],
        gameweek: u32,
    ) -> CaptainChoice {
        let predicted = predictions.get(&player.id()).copied().unwrap_or(0.0);
        let mut factors = vec![(predicted / 15.0).clamp(0.0, 1.0)];
        let mut reasons = vec![format!("{predicted:.1} predicted points")];

        if player.form > 6.0 {
            factors.push(0.9);
            reasons.push(format!("excellent form ({:.1})", player.form));
        } else if player.form > 4.0 {
            factors.push(0.7);
            reasons.push(format!("good form ({:.1})", player.form));
        }

        match player.position() {
            Position::Forward => factors.push(0.8),
            Position::Midfielder => factors.push(0.75),
            _ => {}
        }

        if let Some(fixture) = fixtures_in_gameweek(fixtures, player.team, gameweek).first() {
            if fixture.is_home {
                factors.push(0.8);
                reasons.push("home fixture".into());
            }
            if fixture.difficulty <= 2 {
                factors.push(0.9);
                reasons.push(format!("easy fixture ({})", fixture.difficulty));
            } else if fixture.difficulty >= 4 {
                factors.push(0.5);
                reasons.push(format!("tough fixture ({})", fixture.difficulty));
            }
        }

        if player.price() >= Price::from_millions(self.config.premium_price) {
            factors.push(0.85);
            reasons.push("premium player".into());
        }

        let confidence = factors.iter().sum::<f64>() / factors.len() as f64;
        let is_differential = player.ownership < self.config.differential_ownership
            && predicted > self.config.differential_min_points;

        CaptainChoice {
            player_id: player.id(),
            name: player.name.clone(),
            predicted_points: predicted,
            confidence,
            ownership: player.ownership,
            is_differential,
            reasons,
        }
    }

    /// Every starter as a captain option, best prediction first.
    pub fn rank(
        &self,
        starters: &[Player],
        predictions: &Predictions,
        fixtures: &[Fixture],
        gameweek: u32,
    ) -> Vec<CaptainChoice> {
        let mut choices: Vec<CaptainChoice> = starters
            .iter()
            .map(|p| self.evaluate(p, predictions, fixtures, gameweek))
            .collect();
        choices.sort_by(|a, b| {
            b.predicted_points
                .partial_cmp(&a.predicted_points)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.player_id.cmp(&b.player_id))
        });
        choices
    }

    /// Choose captain and vice among the starters.
    ///
    /// A close, far less owned differential can take the armband from the
    /// top prediction. With the triple captain chip the first option above
    /// the confidence bar is preferred.
    pub fn select(
        &self,
        starters: &[Player],
        predictions: &Predictions,
        fixtures: &[Fixture],
        gameweek: u32,
        triple_captain: bool,
    ) -> Option<CaptaincyPick> {
        let mut ranked = self.rank(starters, predictions, fixtures, gameweek);
        if ranked.is_empty() {
            return None;
        }

        let captain_idx = if triple_captain {
            ranked
                .iter()
                .position(|c| c.confidence > self.config.triple_captain_confidence)
                .unwrap_or(0)
        } else {
            match ranked.as_slice() {
                [best, second, ..]
                    if second.is_differential
                        && second.predicted_points
                            > best.predicted_points * self.config.differential_closeness
                        && second.ownership < best.ownership * self.config.differential_ownership_ratio =>
                {
                    1
                }
                _ => 0,
            }
        };

        let captain = ranked.remove(captain_idx);
        let vice_captain = if ranked.is_empty() {
            None
        } else {
            Some(ranked.remove(0))
        };

        Some(CaptaincyPick {
            captain,
            vice_captain,
            triple_captain,
        })
    }
}
