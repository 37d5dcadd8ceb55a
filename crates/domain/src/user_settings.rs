use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

const DEFAULT_TIME_ZONE: &str = "UTC";
const DEFAULT_MAX_RETRY_COUNT: i32 = 2;
// Minutes from midnight
const DEFAULT_QUIET_HOURS_START: u32 = 22 * 60;
const DEFAULT_QUIET_HOURS_END: u32 = 7 * 60;

/// Singleton per-deployment user preferences. `quiet_hours_*` are stored but
/// deliberately not consulted by the dispatch algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    /// Default delivery target for new reminders that do not set one
    pub target: Option<String>,
    pub timezone: Option<String>,
    pub max_retry_count: Option<i32>,
    /// Minutes from midnight
    pub quiet_hours_start: Option<u32>,
    /// Minutes from midnight
    pub quiet_hours_end: Option<u32>,
    pub locale: Option<String>,
}

impl UserSettings {
    /// Fills in missing or invalid fields. Returns whether anything changed
    /// so callers know the settings need to be persisted again.
    pub fn apply_defaults(&mut self) -> bool {
        let mut updated = false;
        let valid_timezone = self
            .timezone
            .as_deref()
            .map(|tz| tz.parse::<Tz>().is_ok())
            .unwrap_or(false);
        if !valid_timezone {
            self.timezone = Some(DEFAULT_TIME_ZONE.to_string());
            updated = true;
        }
        if self.max_retry_count.map(|count| count < 0).unwrap_or(true) {
            self.max_retry_count = Some(DEFAULT_MAX_RETRY_COUNT);
            updated = true;
        }
        if self.quiet_hours_start.is_none() {
            self.quiet_hours_start = Some(DEFAULT_QUIET_HOURS_START);
            updated = true;
        }
        if self.quiet_hours_end.is_none() {
            self.quiet_hours_end = Some(DEFAULT_QUIET_HOURS_END);
            updated = true;
        }
        if self
            .locale
            .as_deref()
            .map(|locale| locale.trim().is_empty())
            .unwrap_or(true)
        {
            self.locale = Some("en".to_string());
            updated = true;
        }
        updated
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref().filter(|t| !t.trim().is_empty())
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            target: None,
            timezone: None,
            max_retry_count: None,
            quiet_hours_start: None,
            quiet_hours_end: None,
            locale: None,
        }
    }
}
