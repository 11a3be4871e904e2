// Run orchestration: fetch → score → optimize → lineup → captaincy.
//
// Two entry points. `run_initial_squad` builds a squad from scratch;
// `plan_gameweek` takes a saved squad and decides transfers, chip and
// captaincy for the next gameweek. Only the fetch phase awaits; scoring and
// optimization run on the blocking pool.

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use squadcast_core::config::{Config, ProviderConfig};
use squadcast_core::{Availability, Fixture, Player, PlayerHistory, PlayerId, Squad, SquadError, Team};
use squadcast_engine::lineup::{select_lineup, Lineup};
use squadcast_engine::optimizer::{OptimizeError, SquadOptimizer, SquadSolution};
use squadcast_engine::projection::{next_gameweek, project_all, Predictions};
use squadcast_engine::scoring::set_pieces::SetPieceTable;
use squadcast_engine::scoring::{ScoringContext, ScoringModel};
use squadcast_engine::strategy::{
    assess_squad, CaptainSelector, CaptaincyPick, Chip, ChipContext, ChipRecommendation, ChipStrategy,
    SquadIssue, TransferEngine, TransferPlan, TransferSuggestion,
};
use squadcast_provider::convert::{convert_fixtures, convert_players, convert_teams};
use squadcast_provider::{fetch_histories, ProviderError, StatsProvider};

use crate::snapshot::{load_roster_snapshot, SnapshotError, SquadSnapshot};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not fetch data: {0}")]
    Upstream(#[from] ProviderError),

    #[error("could not fetch data within {0:?}")]
    FetchTimeout(Duration),

    #[error(transparent)]
    Optimize(#[from] OptimizeError),

    #[error("saved squad unusable: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("planned transfers break the squad: {0}")]
    Transfer(#[source] SquadError),

    #[error("background task failed: {0}")]
    Task(String),
}

// ---------------------------------------------------------------------------
// Fetch phase
// ---------------------------------------------------------------------------

/// Everything fetched for one run, already converted to the domain model.
#[derive(Debug, Clone, Default)]
pub struct SeasonData {
    pub players: Vec<Player>,
    pub teams: Vec<Team>,
    pub fixtures: Vec<Fixture>,
    pub histories: HashMap<PlayerId, PlayerHistory>,
    /// Players whose history fetch failed.
    pub history_failures: usize,
}

/// Players worth considering for selection: not ruled out and priced.
pub fn is_selectable(player: &Player) -> bool {
    player.availability != Availability::Unavailable && player.price().tenths() > 0
}

/// Fetch players, teams and fixtures concurrently, then histories for the
/// selectable players in batches. The whole phase is bounded by the
/// configured fetch timeout.
pub async fn gather_season_data<P>(
    provider: &P,
    config: &ProviderConfig,
    with_histories: bool,
) -> Result<SeasonData, PipelineError>
where
    P: StatsProvider + ?Sized,
{
    let limit = config.fetch_timeout();
    let fetch = async {
        let (player_records, team_records, fixture_records) = tokio::try_join!(
            provider.fetch_all_players(),
            provider.fetch_teams(),
            provider.fetch_fixtures(None),
        )?;

        let players = convert_players(&player_records);
        let teams = convert_teams(&team_records);
        let fixtures = convert_fixtures(&fixture_records);
        info!(
            players = players.len(),
            teams = teams.len(),
            fixtures = fixtures.len(),
            "season data fetched"
        );

        let mut data = SeasonData {
            players,
            teams,
            fixtures,
            ..SeasonData::default()
        };

        if with_histories {
            let ids: Vec<PlayerId> = data
                .players
                .iter()
                .filter(|p| is_selectable(p))
                .map(Player::id)
                .collect();
            let report = fetch_histories(
                provider,
                &ids,
                config.history_batch_size,
                config.history_batch_pause(),
            )
            .await;
            if !report.failed.is_empty() {
                warn!(failed = report.failed.len(), "some histories could not be fetched");
            }
            data.history_failures = report.failed.len();
            data.histories = report.histories;
        }

        Ok::<_, PipelineError>(data)
    };

    tokio::time::timeout(limit, fetch)
        .await
        .map_err(|_| PipelineError::FetchTimeout(limit))?
}

/// Gameweek projections for `players`. Without a known upcoming gameweek,
/// points per game stands in.
pub fn predict<'a>(
    players: impl IntoIterator<Item = &'a Player>,
    fixtures: &[Fixture],
    gameweek: Option<u32>,
) -> Predictions {
    match gameweek {
        Some(gw) => project_all(players, fixtures, gw),
        None => players
            .into_iter()
            .map(|p| (p.id(), p.points_per_game.max(0.0)))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Initial squad
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RunReport {
    pub gameweek: Option<u32>,
    pub solution: SquadSolution,
    pub lineup: Lineup,
    pub captaincy: Option<CaptaincyPick>,
    pub predictions: Predictions,
    pub candidates: usize,
    pub history_failures: usize,
}

/// Build a squad from scratch and pick its first lineup and captain.
pub async fn run_initial_squad<P>(
    provider: &P,
    config: &Config,
    set_pieces: SetPieceTable,
) -> Result<RunReport, PipelineError>
where
    P: StatsProvider + ?Sized,
{
    info!("fetching season data");
    let data = gather_season_data(provider, &config.provider, true).await?;
    let gameweek = next_gameweek(&data.fixtures);

    let pool: Vec<Player> = data.players.iter().filter(|p| is_selectable(p)).cloned().collect();
    let candidates = pool.len();
    info!(candidates, ?gameweek, "scoring and optimizing");

    let ctx = ScoringContext::new()
        .with_fixtures(data.fixtures.clone())
        .with_teams(&data.teams)
        .with_histories(data.histories)
        .with_set_pieces(set_pieces);
    let model = ScoringModel::from_strategy(&config.strategy);
    let optimizer = SquadOptimizer::new(config.strategy.optimizer.clone());
    let budget = config.game.budget_price();

    let solution = tokio::task::spawn_blocking(move || {
        let scored = model.score_all(&pool, &ctx);
        optimizer.optimize(&scored, budget)
    })
    .await
    .map_err(|e| PipelineError::Task(e.to_string()))??;

    let predictions = predict(solution.squad.players(), &data.fixtures, gameweek);
    let lineup = select_lineup(&solution.squad, &predictions);
    let captaincy = CaptainSelector::new(config.strategy.captain.clone()).select(
        &lineup.starters,
        &predictions,
        &data.fixtures,
        gameweek.unwrap_or_default(),
        false,
    );

    info!(
        status = ?solution.status,
        formation = %lineup.formation,
        projected = lineup.projected_points,
        "initial squad ready"
    );

    Ok(RunReport {
        gameweek,
        solution,
        lineup,
        captaincy,
        predictions,
        candidates,
        history_failures: data.history_failures,
    })
}

// ---------------------------------------------------------------------------
// Gameweek planning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GameweekPlan {
    pub gameweek: Option<u32>,
    pub issues: Vec<SquadIssue>,
    pub chip: Option<ChipRecommendation>,
    pub transfers: TransferPlan,
    /// Cover for unavailable players, listed even when not part of the plan.
    pub injury_cover: Vec<TransferSuggestion>,
    /// The squad after the planned transfers.
    pub squad: Squad,
    pub lineup: Lineup,
    pub captaincy: Option<CaptaincyPick>,
    pub predictions: Predictions,
    pub free_transfers_next: u32,
}

/// Plan the next gameweek for a saved squad.
pub async fn plan_gameweek<P>(
    provider: &P,
    config: &Config,
    saved: &SquadSnapshot,
) -> Result<GameweekPlan, PipelineError>
where
    P: StatsProvider + ?Sized,
{
    let data = gather_season_data(provider, &config.provider, false).await?;
    let gameweek = next_gameweek(&data.fixtures);
    let squad = load_roster_snapshot(saved, &data.players)?;
    let predictions = predict(&data.players, &data.fixtures, gameweek);
    let gw = gameweek.unwrap_or_default();

    let issues = assess_squad(&squad);
    let current_lineup = select_lineup(&squad, &predictions);

    let chip = ChipStrategy::new(config.strategy.chips.clone()).recommend(
        &ChipContext {
            squad: &squad,
            lineup: &current_lineup,
            predictions: &predictions,
            fixtures: &data.fixtures,
            gameweek: gw,
        },
        &saved.chips_used,
    );
    let chip_kind = chip.as_ref().map(|c| c.chip);
    let unlimited = matches!(chip_kind, Some(Chip::Wildcard | Chip::FreeHit));

    let engine = TransferEngine::new(config.strategy.transfers.clone());
    let suggestions =
        engine.suggest_transfers(&squad, &data.players, &predictions, saved.free_transfers, unlimited);
    let transfers = engine.select_transfers(&squad, &suggestions, saved.free_transfers, unlimited);
    let injury_cover = engine.injury_replacements(&squad, &data.players, &predictions);

    let mut updated = squad.clone();
    let sold = engine
        .apply_transfers(&mut updated, &transfers)
        .map_err(PipelineError::Transfer)?;
    for player in &sold {
        info!(player = %player.name, "transfer out");
    }

    let lineup = select_lineup(&updated, &predictions);
    let captaincy = CaptainSelector::new(config.strategy.captain.clone()).select(
        &lineup.starters,
        &predictions,
        &data.fixtures,
        gw,
        chip_kind == Some(Chip::TripleCaptain),
    );
    let free_transfers_next = engine.next_free_transfers(saved.free_transfers, transfers.transfers.len());

    info!(
        ?gameweek,
        issues = issues.len(),
        transfers = transfers.transfers.len(),
        chip = ?chip_kind,
        "gameweek plan ready"
    );

    Ok(GameweekPlan {
        gameweek,
        issues,
        chip,
        transfers,
        injury_cover,
        squad: updated,
        lineup,
        captaincy,
        predictions,
        free_transfers_next,
    })
}
