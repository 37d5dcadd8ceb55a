mod inmemory;
mod postgres;

pub use inmemory::InMemoryReminderRepo;
use nudge_domain::{Reminder, ID};
pub use postgres::PostgresReminderRepo;

#[async_trait::async_trait]
pub trait IReminderRepo: Send + Sync {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()>;
    async fn save(&self, reminder: &Reminder) -> anyhow::Result<()>;
    async fn find(&self, reminder_id: &ID) -> Option<Reminder>;
    /// Active reminders whose next attempt (or start time when the next
    /// attempt is not yet initialized) is not after `now` (UTC millis)
    async fn find_due(&self, now: i64) -> Vec<Reminder>;
    /// All reminders for a target, ordered by start time ascending
    async fn find_by_target(&self, target: &str) -> Vec<Reminder>;
    async fn delete(&self, reminder_id: &ID) -> Option<Reminder>;
}
