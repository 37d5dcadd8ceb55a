use chrono::{Duration, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// How often a `Reminder` should fire. A new variant (for example a custom
/// interval) only needs a new match arm in `next`, the dispatch state machine
/// never inspects the variants itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Once,
    Daily,
    Weekly,
    Monthly,
}

impl Recurrence {
    /// Advances a base timestamp (UTC millis) to the next occurrence.
    ///
    /// `Once` returns the base unchanged, callers must treat that as terminal
    /// and never loop on it. Monthly additions clamp to the last valid day of
    /// the resulting month (Jan 31 -> Feb 28/29).
    pub fn next(&self, base: i64) -> i64 {
        let base_dt = match Utc.timestamp_millis_opt(base).single() {
            Some(dt) => dt,
            None => return base,
        };
        match self {
            Self::Once => base,
            Self::Daily => (base_dt + Duration::days(1)).timestamp_millis(),
            Self::Weekly => (base_dt + Duration::days(7)).timestamp_millis(),
            Self::Monthly => base_dt
                .checked_add_months(Months::new(1))
                .map(|dt| dt.timestamp_millis())
                .unwrap_or(base),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Once)
    }
}

impl Default for Recurrence {
    fn default() -> Self {
        Self::Once
    }
}

impl Display for Recurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let repr = match self {
            Self::Once => "once",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        };
        write!(f, "{}", repr)
    }
}

#[derive(Error, Debug)]
pub enum InvalidRecurrenceError {
    #[error("Invalid recurrence: {0}")]
    Unknown(String),
}

impl FromStr for Recurrence {
    type Err = InvalidRecurrenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "once" => Ok(Self::Once),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(InvalidRecurrenceError::Unknown(s.to_string())),
        }
    }
}
