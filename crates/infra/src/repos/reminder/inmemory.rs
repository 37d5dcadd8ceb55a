use super::IReminderRepo;
use crate::repos::shared::inmemory_repo::*;
use nudge_domain::{Reminder, ID};

pub struct InMemoryReminderRepo {
    reminders: std::sync::Mutex<Vec<Reminder>>,
}

impl InMemoryReminderRepo {
    pub fn new() -> Self {
        Self {
            reminders: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IReminderRepo for InMemoryReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        insert(reminder, &self.reminders);
        Ok(())
    }

    async fn save(&self, reminder: &Reminder) -> anyhow::Result<()> {
        save(reminder, &self.reminders);
        Ok(())
    }

    async fn find(&self, reminder_id: &ID) -> Option<Reminder> {
        find(reminder_id, &self.reminders)
    }

    async fn find_due(&self, now: i64) -> Vec<Reminder> {
        find_by(&self.reminders, |reminder: &Reminder| {
            reminder.active && reminder.next_attempt_at.unwrap_or(reminder.start_time) <= now
        })
    }

    async fn find_by_target(&self, target: &str) -> Vec<Reminder> {
        let mut reminders = find_by(&self.reminders, |reminder: &Reminder| {
            reminder.target == target
        });
        reminders.sort_by_key(|reminder| reminder.start_time);
        reminders
    }

    async fn delete(&self, reminder_id: &ID) -> Option<Reminder> {
        delete(reminder_id, &self.reminders)
    }
}
