use crate::domain::task_state::errors::TaskStateError;
use chrono::{Local, NaiveDate};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

lazy_static! {
    static ref DATE_KEY_REGEX: regex::Regex = regex::Regex::new(r"^\d{8}$").unwrap();
}

const DATE_KEY_FORMAT: &str = "%Y%m%d";

/// Calendar day a snapshot is stored under, formatted as `YYYYMMDD`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Validate)]
#[serde(try_from = "String", into = "String")]
pub struct DateKey {
    #[validate(regex(path = *DATE_KEY_REGEX))]
    value: String,
}

impl DateKey {
    /// Parse an explicit key. Only eight digits naming a real calendar day are accepted;
    /// surrounding whitespace is an error.
    pub fn parse(value: &str) -> Result<Self, TaskStateError> {
        let key = Self {
            value: value.to_string(),
        };
        key.validate()
            .map_err(|_| TaskStateError::InvalidDateKey(value.to_string()))?;
        NaiveDate::parse_from_str(&key.value, DATE_KEY_FORMAT)
            .map_err(|_| TaskStateError::InvalidDateKey(value.to_string()))?;
        Ok(key)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            value: date.format(DATE_KEY_FORMAT).to_string(),
        }
    }

    /// Today's key in the local timezone.
    pub fn today() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl TryFrom<String> for DateKey {
    type Error = TaskStateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DateKey> for String {
    fn from(key: DateKey) -> Self {
        key.value
    }
}
