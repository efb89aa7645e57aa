use super::dto::{DailyTotals, HistoryQuery};
use crate::domain::task_state::{
    errors::TaskStateError,
    repository::{SnapshotFilter, TaskStateRepository},
};
use std::collections::BTreeMap;

/// Reads back stored snapshots as per-day totals, oldest day first.
pub struct TaskHistoryUseCase<'a> {
    repository: Box<dyn TaskStateRepository + 'a>,
}

impl<'a> TaskHistoryUseCase<'a> {
    pub fn new(repository: Box<dyn TaskStateRepository + 'a>) -> Self {
        Self { repository }
    }

    pub async fn execute(&mut self, query: HistoryQuery) -> Result<Vec<DailyTotals>, TaskStateError> {
        if query.days == 0 {
            return Err(TaskStateError::Validation(
                "days must be at least 1".to_string(),
            ));
        }

        let filter = SnapshotFilter {
            sys_name: query.sys_name,
            employee: query.employee,
        };
        let rows = self.repository.history(&filter, query.days).await?;

        // Summed here rather than in SQL: MySQL's SUM yields DECIMAL.
        let mut by_day: BTreeMap<_, DailyTotals> = BTreeMap::new();
        for row in rows {
            let entry = by_day
                .entry(row.datestr.clone())
                .or_insert_with(|| DailyTotals {
                    datestr: row.datestr.clone(),
                    counts: Default::default(),
                    groups: 0,
                });
            entry.counts.add(&row.counts);
            entry.groups += 1;
        }

        let skip = by_day.len().saturating_sub(query.days as usize);
        Ok(by_day.into_values().skip(skip).collect())
    }
}
