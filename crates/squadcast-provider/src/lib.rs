// Stats provider: the async source of player, team, fixture and history
// records, with an HTTP implementation, a response cache and batched
// history fetching.

pub mod batch;
pub mod cache;
pub mod client;
pub mod convert;
pub mod records;

use async_trait::async_trait;
use thiserror::Error;

use squadcast_core::PlayerId;

pub use batch::{fetch_histories, HistoryBatchReport};
pub use client::FplClient;
pub use records::{FixtureRecord, HistoryRecord, PastSeasonRecord, PlayerRecord, TeamRecord};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { status: u16, url: String },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of upstream records. Implementations must be shareable across
/// tasks; the pipeline fetches players, teams and fixtures concurrently.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn fetch_all_players(&self) -> Result<Vec<PlayerRecord>, ProviderError>;

    async fn fetch_teams(&self) -> Result<Vec<TeamRecord>, ProviderError>;

    /// All fixtures, or only those of `gameweek`.
    async fn fetch_fixtures(&self, gameweek: Option<u32>) -> Result<Vec<FixtureRecord>, ProviderError>;

    /// Past-season summary for one player. `None` when the source has no
    /// record of them.
    async fn fetch_player_history(&self, id: PlayerId) -> Result<Option<HistoryRecord>, ProviderError>;
}
