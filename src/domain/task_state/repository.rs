use super::entity::{GroupCounts, TaskStateCount};
use super::errors::TaskStateError;
use super::grouping::GroupingStrategy;
use crate::domain::shared::date_key::DateKey;
use async_trait::async_trait;

/// Filters applied when reading snapshots back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotFilter {
    pub sys_name: Option<String>,
    pub employee: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskStateRepository: Send {
    /// Count tasks per status, grouped as requested.
    async fn aggregate(
        &mut self,
        grouping: GroupingStrategy,
    ) -> Result<Vec<GroupCounts>, TaskStateError>;

    /// Delete every snapshot row for `date` and insert `rows`, all in one transaction.
    async fn replace_snapshot(
        &mut self,
        date: &DateKey,
        rows: &[TaskStateCount],
    ) -> Result<(), TaskStateError>;

    async fn snapshot_rows(
        &mut self,
        date: &DateKey,
    ) -> Result<Vec<TaskStateCount>, TaskStateError>;

    /// Snapshot rows matching `filter` for the newest `days` stored dates, newest date first.
    async fn history(
        &mut self,
        filter: &SnapshotFilter,
        days: u32,
    ) -> Result<Vec<TaskStateCount>, TaskStateError>;
}
