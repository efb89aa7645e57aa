use super::errors::TaskStateError;
use std::{fmt, str::FromStr};

/// How task rows are bucketed before counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupingStrategy {
    /// One row per day covering every task.
    Global,
    /// One row per day for each distinct `(sys_name, employee)` pair.
    #[default]
    BySystemEmployee,
}

impl GroupingStrategy {
    /// Columns selected and grouped on, in order.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            GroupingStrategy::Global => &[],
            GroupingStrategy::BySystemEmployee => &["sys_name", "employee"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GroupingStrategy::Global => "global",
            GroupingStrategy::BySystemEmployee => "system_employee",
        }
    }
}

impl fmt::Display for GroupingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupingStrategy {
    type Err = TaskStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "global" | "none" => Ok(GroupingStrategy::Global),
            "system_employee" | "sys_name_employee" => Ok(GroupingStrategy::BySystemEmployee),
            other => Err(TaskStateError::Configuration(format!(
                "unknown grouping strategy '{other}', expected 'global' or 'system_employee'"
            ))),
        }
    }
}
