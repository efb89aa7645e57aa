use crate::domain::{shared::date_key::DateKey, task_state::entity::StatusCounts};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub days: u32,
    pub sys_name: Option<String>,
    pub employee: Option<String>,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            days: DEFAULT_HISTORY_DAYS,
            sys_name: None,
            employee: None,
        }
    }
}

/// Snapshot counts for one day, summed over every matching group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotals {
    pub datestr: DateKey,
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub groups: usize,
}
