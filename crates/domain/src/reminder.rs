use crate::shared::entity::{Entity, ID};
use crate::shared::recurrence::Recurrence;
use serde::{Deserialize, Serialize};

/// A `Reminder` is the unit of scheduling: a notification that should be
/// delivered to `target` at `start_time` and then resent until it is either
/// completed by the owner or the delivery attempts for the current
/// occurrence are used up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: ID,
    /// Opaque recipient identifier understood by the delivery channel
    pub target: String,
    pub title: String,
    pub description: Option<String>,
    /// UTC millis of the current occurrence's base firing time
    pub start_time: i64,
    /// UTC millis of the next scheduled delivery attempt. `None` means
    /// either "not yet initialized" (use `start_time`) or terminal/inactive.
    pub next_attempt_at: Option<i64>,
    pub last_sent_at: Option<i64>,
    /// Channel message id of the most recent successful send for the
    /// current occurrence, kept around to clean up stale retry messages
    pub last_sent_message_id: Option<i64>,
    /// Delivery attempts made for the current occurrence
    pub send_attempts: u32,
    pub recurrence: Recurrence,
    pub active: bool,
}

impl Entity for Reminder {
    fn id(&self) -> &ID {
        &self.id
    }
}

impl Reminder {
    pub fn new(target: String, title: String, start_time: i64, recurrence: Recurrence) -> Self {
        Self {
            id: Default::default(),
            target,
            title,
            description: None,
            start_time,
            next_attempt_at: Some(start_time),
            last_sent_at: None,
            last_sent_message_id: None,
            send_attempts: 0,
            recurrence,
            active: true,
        }
    }

    /// Resets the attempt bookkeeping and seeds `next_attempt_at` from
    /// `start_time`. Applied whenever a reminder is (re)saved by its owner.
    pub fn reset_attempt_tracking(&mut self) {
        self.next_attempt_at = Some(self.start_time);
        self.send_attempts = 0;
        self.last_sent_at = None;
        self.last_sent_message_id = None;
    }

    /// Lazily initializes scheduling state for reminders persisted before
    /// `next_attempt_at` existed.
    pub fn ensure_next_attempt(&mut self, now: i64) {
        if self.next_attempt_at.is_none() {
            if self.start_time <= 0 {
                self.start_time = now;
            }
            self.next_attempt_at = Some(self.start_time);
        }
    }

    /// Takes the reminder out of dispatch permanently (until the owner
    /// explicitly reactivates it).
    pub fn deactivate(&mut self) {
        self.active = false;
        self.next_attempt_at = None;
    }

    pub fn has_used_all_attempts(&self, max_delivery_attempts: u32) -> bool {
        self.send_attempts >= max_delivery_attempts
    }

    /// Terminal transition for the current occurrence: a `Once` reminder is
    /// deactivated, a recurring one advances to a fresh occurrence with
    /// zeroed attempt bookkeeping. Used both when attempts are exhausted and
    /// when the owner completes the reminder.
    pub fn finish_occurrence(&mut self) {
        if self.recurrence.is_terminal() {
            self.deactivate();
            return;
        }
        self.start_time = self.recurrence.next(self.start_time);
        self.next_attempt_at = Some(self.start_time);
        self.send_attempts = 0;
        self.last_sent_at = None;
        self.last_sent_message_id = None;
    }

    /// Renders the notification text. Pure function of title, description and
    /// the completed flag.
    pub fn format_message(&self, completed: bool) -> String {
        let prefix = if completed { "\u{2705} " } else { "\u{23f0} " };
        match &self.description {
            Some(description) if !description.trim().is_empty() => {
                format!("{}{}\n{}", prefix, self.title, description)
            }
            _ => format!("{}{}", prefix, self.title),
        }
    }
}
