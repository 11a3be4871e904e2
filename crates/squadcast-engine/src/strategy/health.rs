// Squad health: injuries, doubts, poor form and falling prices.

use serde::Serialize;

use squadcast_core::{Availability, Player, PlayerId, Squad};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SquadIssue {
    Unavailable { player_id: PlayerId, news: String },
    Doubtful { player_id: PlayerId, chance: u8 },
    PoorForm { player_id: PlayerId, form: f64 },
    PriceDrop { player_id: PlayerId, change: f64 },
}

impl SquadIssue {
    pub fn player_id(&self) -> PlayerId {
        match self {
            SquadIssue::Unavailable { player_id, .. }
            | SquadIssue::Doubtful { player_id, .. }
            | SquadIssue::PoorForm { player_id, .. }
            | SquadIssue::PriceDrop { player_id, .. } => *player_id,
        }
    }

    pub fn is_injury(&self) -> bool {
        matches!(self, SquadIssue::Unavailable { .. })
    }
}

const DOUBTFUL_BELOW: u8 = 75;
const POOR_FORM_BELOW: f64 = 2.0;
/// Season price change, in tenths, below which a player counts as falling.
const PRICE_DROP_BELOW: i32 = -3;

/// Issues for one player. A player can have several.
pub fn player_issues(player: &Player) -> Vec<SquadIssue> {
    let mut issues = Vec::new();
    let id = player.id();

    match (player.availability, player.chance_of_playing) {
        (Availability::Unavailable, _) => issues.push(SquadIssue::Unavailable {
            player_id: id,
            news: player.news.clone(),
        }),
        (_, Some(chance)) if chance < DOUBTFUL_BELOW => {
            issues.push(SquadIssue::Doubtful { player_id: id, chance })
        }
        _ => {}
    }

    if player.form < POOR_FORM_BELOW {
        issues.push(SquadIssue::PoorForm {
            player_id: id,
            form: player.form,
        });
    }

    if player.cost_change_start < PRICE_DROP_BELOW {
        issues.push(SquadIssue::PriceDrop {
            player_id: id,
            change: f64::from(player.cost_change_start) / 10.0,
        });
    }

    issues
}

/// Every issue in the squad, in squad order.
pub fn assess_squad(squad: &Squad) -> Vec<SquadIssue> {
    squad.players().iter().flat_map(player_issues).collect()
}
