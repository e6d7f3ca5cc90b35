// Source trait for raw metric snapshots
use crate::domain::snapshot::Snapshot;
use async_trait::async_trait;

#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Fetch the current snapshot. Any error counts as a transient failure of one poll.
    async fn fetch(&self) -> anyhow::Result<Snapshot>;
}
