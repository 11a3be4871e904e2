// Application layer: run orchestration, snapshots and printed summaries.

pub mod pipeline;
pub mod report;
pub mod snapshot;
