// squadcast entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Load the set-piece table
// 4. Build the stats client
// 5. Plan the next gameweek for the saved squad, or build a new squad
// 6. Print the summary and write a snapshot

use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use tracing::{error, info, warn};

use squadcast_app::pipeline::{self, PipelineError};
use squadcast_app::report;
use squadcast_app::snapshot::{self, SquadSnapshot};
use squadcast_core::config;
use squadcast_engine::optimizer::OptimizeError;
use squadcast_engine::scoring::set_pieces::SetPieceTable;
use squadcast_provider::FplClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("squadcast starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {} {}, budget {:.1}m, preset {:?}",
        config.game.name, config.game.season, config.game.budget, config.strategy.preset
    );

    // 3. Set-piece table (optional: the sub-score falls back without it)
    let set_pieces = match SetPieceTable::load(Path::new(&config.data_paths.set_pieces)) {
        Ok(table) => table,
        Err(e) => {
            warn!("set-piece table unavailable, continuing without it: {e}");
            SetPieceTable::default()
        }
    };

    // 4. Stats client
    let client = FplClient::from_config(&config.provider).context("failed to build HTTP client")?;

    // 5. Plan or build
    let snapshot_dir = Path::new(&config.data_paths.snapshot_dir);
    let latest = snapshot::latest_snapshot_path(snapshot_dir);
    let (summary, next) = if latest.exists() {
        let saved = snapshot::read_snapshot(&latest).context("failed to read saved squad")?;
        info!(path = %latest.display(), "planning gameweek for saved squad");
        let plan = pipeline::plan_gameweek(&client, &config, &saved)
            .await
            .map_err(explain)?;
        (report::render_plan(&plan), SquadSnapshot::from_plan(&plan, &saved, Utc::now()))
    } else {
        info!("no saved squad, building one");
        let run = pipeline::run_initial_squad(&client, &config, set_pieces)
            .await
            .map_err(explain)?;
        (report::render_initial(&run), SquadSnapshot::from_report(&run, Utc::now()))
    };

    // 6. Output
    println!("{summary}");
    let path = snapshot::write_snapshot(snapshot_dir, &next).context("failed to write snapshot")?;
    println!("Snapshot written to {}", path.display());
    info!(path = %path.display(), "squadcast finished");
    Ok(())
}

/// Turn a pipeline failure into the message shown to the user.
fn explain(e: PipelineError) -> anyhow::Error {
    error!("run failed: {e}");
    let headline = match &e {
        PipelineError::Upstream(_) | PipelineError::FetchTimeout(_) => "could not fetch data",
        PipelineError::Optimize(OptimizeError::Infeasible { .. } | OptimizeError::EmptyPool) => {
            "no valid squad exists for the current player pool and rules"
        }
        PipelineError::Optimize(_) => "squad optimization failed",
        PipelineError::Snapshot(_) => "the saved squad could not be used",
        PipelineError::Transfer(_) | PipelineError::Task(_) => "internal error",
    };
    anyhow::Error::new(e).context(headline)
}

/// Initialize tracing to log to a file, keeping the terminal for the summary.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("squadcast.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("squadcast=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
