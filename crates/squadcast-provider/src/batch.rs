// Batched, rate-limited history fetching.
//
// Histories are requested `batch_size` at a time, concurrently within a
// batch, with a pause between batches to stay polite to the upstream API.
// A player whose fetch fails is logged and left out; the run carries on.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{info, warn};

use squadcast_core::{PlayerHistory, PlayerId};

use crate::convert::history_from_record;
use crate::StatsProvider;

#[derive(Debug, Clone, Default)]
pub struct HistoryBatchReport {
    pub histories: HashMap<PlayerId, PlayerHistory>,
    /// Players the source has no history for.
    pub missing: Vec<PlayerId>,
    /// Players whose fetch failed.
    pub failed: Vec<PlayerId>,
}

impl HistoryBatchReport {
    pub fn fetched(&self) -> usize {
        self.histories.len()
    }
}

pub async fn fetch_histories<P>(
    provider: &P,
    ids: &[PlayerId],
    batch_size: usize,
    pause: Duration,
) -> HistoryBatchReport
where
    P: StatsProvider + ?Sized,
{
    let mut report = HistoryBatchReport::default();
    let batch_size = batch_size.max(1);
    let batches = ids.len().div_ceil(batch_size);

    for (index, batch) in ids.chunks(batch_size).enumerate() {
        if index > 0 && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }

        let results = join_all(batch.iter().map(|&id| async move {
            (id, provider.fetch_player_history(id).await)
        }))
        .await;

        for (id, result) in results {
            match result {
                Ok(Some(record)) => {
                    report.histories.insert(id, history_from_record(&record));
                }
                Ok(None) => report.missing.push(id),
                Err(e) => {
                    warn!(player = id, "history fetch failed: {e}");
                    report.failed.push(id);
                }
            }
        }

        info!(
            batch = index + 1,
            batches,
            fetched = report.histories.len(),
            "history batch complete"
        );
    }

    report
}
