use crate::domain::shared::date_key::DateKey;
use serde::{Deserialize, Serialize};

/// Workflow stage stored in `t_task.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    NotStarted = 0,
    Developing = 1,
    Testing = 2,
    Releasable = 3,
    Finished = 4,
    Closed = 5,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::NotStarted,
        TaskStatus::Developing,
        TaskStatus::Testing,
        TaskStatus::Releasable,
        TaskStatus::Finished,
        TaskStatus::Closed,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Everything before `Finished` still counts as open work.
    pub fn is_unfinished(self) -> bool {
        self.code() < TaskStatus::Finished.code()
    }
}

/// Per-status row counts for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: i64,
    pub unfinished: i64,
    pub not_started: i64,
    pub developing: i64,
    pub testing: i64,
    pub releasable: i64,
    pub finished: i64,
    pub closed: i64,
}

impl StatusCounts {
    /// Tally counts from raw status codes. Unknown codes contribute to `total` only,
    /// which [`StatusCounts::is_consistent`] then reports.
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        let mut counts = Self::default();
        for code in statuses {
            counts.total += 1;
            if code < TaskStatus::Finished.code() {
                counts.unfinished += 1;
            }
            match TaskStatus::from_code(code) {
                Some(TaskStatus::NotStarted) => counts.not_started += 1,
                Some(TaskStatus::Developing) => counts.developing += 1,
                Some(TaskStatus::Testing) => counts.testing += 1,
                Some(TaskStatus::Releasable) => counts.releasable += 1,
                Some(TaskStatus::Finished) => counts.finished += 1,
                Some(TaskStatus::Closed) => counts.closed += 1,
                None => {}
            }
        }
        counts
    }

    pub fn open_sum(&self) -> i64 {
        self.not_started + self.developing + self.testing + self.releasable
    }

    pub fn bucket_sum(&self) -> i64 {
        self.open_sum() + self.finished + self.closed
    }

    /// Every row lands in exactly one bucket and `unfinished` matches the open buckets.
    pub fn is_consistent(&self) -> bool {
        self.bucket_sum() == self.total && self.unfinished == self.open_sum()
    }

    pub fn add(&mut self, other: &StatusCounts) {
        self.total += other.total;
        self.unfinished += other.unfinished;
        self.not_started += other.not_started;
        self.developing += other.developing;
        self.testing += other.testing;
        self.releasable += other.releasable;
        self.finished += other.finished;
        self.closed += other.closed;
    }
}

/// One row of the aggregation query. Grouping values are `None` when the task column was
/// null, or when aggregating without grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCounts {
    pub sys_name: Option<String>,
    pub employee: Option<String>,
    pub counts: StatusCounts,
}

/// A row of `t_task_state_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStateCount {
    pub datestr: DateKey,
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub sys_name: String,
    pub employee: String,
}

impl TaskStateCount {
    pub fn from_group(datestr: DateKey, group: GroupCounts) -> Self {
        Self {
            datestr,
            counts: group.counts,
            sys_name: group.sys_name.unwrap_or_default(),
            employee: group.employee.unwrap_or_default(),
        }
    }
}
