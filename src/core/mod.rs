//! Snapshot aggregation and refresh pipeline

mod refresh_scheduler;
mod snapshot_builder;

pub use refresh_scheduler::{RefreshHandle, RefreshRequest, RefreshScheduler};
pub use snapshot_builder::SnapshotBuilder;
