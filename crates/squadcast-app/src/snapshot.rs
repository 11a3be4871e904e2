// JSON snapshots of a selected squad.
//
// A snapshot records what was chosen and why (scores, projections, status)
// and carries the state the next run needs: free transfers and chips used.
// Each write produces a timestamped file plus `latest.json`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use squadcast_core::{Player, PlayerId, Position, Price, Squad, SquadError, TeamId};
use squadcast_engine::optimizer::SolveStatus;
use squadcast_engine::strategy::ChipUsage;

use crate::pipeline::{GameweekPlan, RunReport};

const LATEST: &str = "latest.json";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot player {0} is no longer in the player pool")]
    UnknownPlayer(PlayerId),

    #[error(transparent)]
    Squad(#[from] SquadError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPlayer {
    pub id: PlayerId,
    pub name: String,
    pub team: TeamId,
    pub position: Position,
    pub price: Price,
    /// Weighted score at selection time, when the squad came from the
    /// optimizer.
    pub score: Option<f64>,
    pub projected_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadSnapshot {
    pub generated_at: DateTime<Utc>,
    pub gameweek: Option<u32>,
    pub status: Option<SolveStatus>,
    pub budget: Price,
    pub spent: Price,
    /// Budget left in millions; negative when prices moved past the budget.
    pub remaining: f64,
    pub formation: String,
    pub lineup: Vec<PlayerId>,
    pub bench: Vec<PlayerId>,
    pub captain: Option<PlayerId>,
    pub vice_captain: Option<PlayerId>,
    pub triple_captain: bool,
    pub free_transfers: u32,
    #[serde(default)]
    pub chips_used: ChipUsage,
    pub players: Vec<SnapshotPlayer>,
}

fn snapshot_player(player: &Player, score: Option<f64>, projected: f64) -> SnapshotPlayer {
    SnapshotPlayer {
        id: player.id(),
        name: player.name.clone(),
        team: player.team,
        position: player.position(),
        price: player.price(),
        score,
        projected_points: projected,
    }
}

impl SquadSnapshot {
    /// Snapshot of a freshly built squad. One free transfer, no chips used.
    pub fn from_report(report: &RunReport, generated_at: DateTime<Utc>) -> Self {
        let squad = &report.solution.squad;
        let players = report
            .solution
            .scored
            .iter()
            .map(|sp| {
                let projected = report.predictions.get(&sp.player.id()).copied().unwrap_or(0.0);
                snapshot_player(&sp.player, Some(sp.total()), projected)
            })
            .collect();

        Self {
            generated_at,
            gameweek: report.gameweek,
            status: Some(report.solution.status),
            budget: squad.budget(),
            spent: squad.spent(),
            remaining: squad.remaining_budget(),
            formation: report.lineup.formation.to_string(),
            lineup: report.lineup.starter_ids(),
            bench: report.lineup.bench_ids(),
            captain: report.captaincy.as_ref().map(|c| c.captain.player_id),
            vice_captain: report
                .captaincy
                .as_ref()
                .and_then(|c| c.vice_captain.as_ref())
                .map(|v| v.player_id),
            triple_captain: false,
            free_transfers: 1,
            chips_used: ChipUsage::default(),
            players,
        }
    }

    /// Snapshot after a gameweek plan, carrying forward chip usage.
    pub fn from_plan(plan: &GameweekPlan, previous: &SquadSnapshot, generated_at: DateTime<Utc>) -> Self {
        let mut chips_used = previous.chips_used.clone();
        if let (Some(chip), Some(gw)) = (plan.chip.as_ref(), plan.gameweek) {
            chips_used.record(chip.chip, gw);
        }
        let players = plan
            .squad
            .players()
            .iter()
            .map(|p| {
                let projected = plan.predictions.get(&p.id()).copied().unwrap_or(0.0);
                snapshot_player(p, None, projected)
            })
            .collect();

        Self {
            generated_at,
            gameweek: plan.gameweek,
            status: None,
            budget: plan.squad.budget(),
            spent: plan.squad.spent(),
            remaining: plan.squad.remaining_budget(),
            formation: plan.lineup.formation.to_string(),
            lineup: plan.lineup.starter_ids(),
            bench: plan.lineup.bench_ids(),
            captain: plan.captaincy.as_ref().map(|c| c.captain.player_id),
            vice_captain: plan
                .captaincy
                .as_ref()
                .and_then(|c| c.vice_captain.as_ref())
                .map(|v| v.player_id),
            triple_captain: plan.captaincy.as_ref().is_some_and(|c| c.triple_captain),
            free_transfers: plan.free_transfers_next,
            chips_used,
            players,
        }
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

pub fn latest_snapshot_path(dir: &Path) -> PathBuf {
    dir.join(LATEST)
}

/// Write `snapshot` to a timestamped file and to `latest.json` in `dir`,
/// creating the directory if needed. Returns the timestamped path.
pub fn write_snapshot(dir: &Path, snapshot: &SquadSnapshot) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(dir).map_err(|source| SnapshotError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let name = format!(
        "squad-gw{}-{}.json",
        snapshot.gameweek.map_or_else(|| "na".to_string(), |gw| gw.to_string()),
        snapshot.generated_at.format("%Y%m%dT%H%M%SZ")
    );
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(snapshot).map_err(|source| SnapshotError::Parse {
        path: path.clone(),
        source,
    })?;

    for target in [&path, &latest_snapshot_path(dir)] {
        fs::write(target, &json).map_err(|source| SnapshotError::Io {
            path: target.to_path_buf(),
            source,
        })?;
    }
    Ok(path)
}

pub fn read_snapshot(path: &Path) -> Result<SquadSnapshot, SnapshotError> {
    let text = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| SnapshotError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Rebuild the saved squad from the current player pool, so prices, form
/// and availability are today's. The budget is the saved one.
pub fn load_roster_snapshot(snapshot: &SquadSnapshot, players: &[Player]) -> Result<Squad, SnapshotError> {
    let roster = snapshot
        .players
        .iter()
        .map(|saved| {
            players
                .iter()
                .find(|p| p.id() == saved.id)
                .cloned()
                .ok_or(SnapshotError::UnknownPlayer(saved.id))
        })
        .collect::<Result<Vec<Player>, _>>()?;
    Ok(Squad::new(roster, snapshot.budget)?)
}
