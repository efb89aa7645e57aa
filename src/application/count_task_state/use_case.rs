use crate::domain::{
    shared::date_key::DateKey,
    task_state::{
        entity::TaskStateCount, errors::TaskStateError, grouping::GroupingStrategy,
        repository::TaskStateRepository,
    },
};

/// Computes today's per-status task counts and replaces the day's snapshot with them.
pub struct CountTaskStateUseCase<'a> {
    repository: Box<dyn TaskStateRepository + 'a>,
    grouping: GroupingStrategy,
}

impl<'a> CountTaskStateUseCase<'a> {
    pub fn new(repository: Box<dyn TaskStateRepository + 'a>, grouping: GroupingStrategy) -> Self {
        Self {
            repository,
            grouping,
        }
    }

    /// Aggregate, then delete and re-insert every snapshot row for `date` atomically.
    ///
    /// Re-running on the same date replaces the rows rather than adding to them. Groups whose
    /// buckets don't add up (unknown or NULL status codes) are stored as counted, with a
    /// warning. On any error nothing is written and the stored snapshot for `date` is left
    /// as it was.
    pub async fn execute(&mut self, date: DateKey) -> Result<Vec<TaskStateCount>, TaskStateError> {
        let groups = self.repository.aggregate(self.grouping).await?;

        let rows: Vec<TaskStateCount> = groups
            .into_iter()
            .map(|group| TaskStateCount::from_group(date.clone(), group))
            .collect();

        for row in &rows {
            if !row.counts.is_consistent() {
                tracing::warn!(
                    datestr = %row.datestr,
                    sys_name = %row.sys_name,
                    employee = %row.employee,
                    bucket_sum = row.counts.bucket_sum(),
                    unfinished = row.counts.unfinished,
                    total = row.counts.total,
                    "Status buckets do not add up to total; tasks with unknown or NULL status"
                );
            }
            tracing::info!(
                datestr = %row.datestr,
                sys_name = %row.sys_name,
                employee = %row.employee,
                total = row.counts.total,
                unfinished = row.counts.unfinished,
                not_started = row.counts.not_started,
                developing = row.counts.developing,
                testing = row.counts.testing,
                releasable = row.counts.releasable,
                finished = row.counts.finished,
                closed = row.counts.closed,
                "taskCount"
            );
        }

        self.repository.replace_snapshot(&date, &rows).await?;
        tracing::info!(
            datestr = %date,
            grouping = %self.grouping,
            rows = rows.len(),
            "Task state snapshot stored"
        );
        Ok(rows)
    }
}
