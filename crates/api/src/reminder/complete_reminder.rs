use crate::shared::usecase::UseCase;
use nudge_domain::ID;
use nudge_infra::NudgeContext;
use thiserror::Error;

/// Marks the current occurrence of a reminder as done on behalf of its
/// owner. Runs on an independent trigger (a pressed completion action) and
/// may race a dispatch tick for the same reminder; the store's last write
/// wins.
#[derive(Debug)]
pub struct CompleteReminderUseCase {
    pub reminder_id: ID,
    /// Identity of whoever triggered the completion, matched against the
    /// reminder's target
    pub requester: String,
}

/// What the caller needs to update the original notification in place
#[derive(Debug)]
pub struct CompletionNotice {
    pub message_id: Option<i64>,
    pub updated_text: String,
}

#[derive(Debug, Error)]
pub enum UseCaseErrors {
    #[error("Reminder not found")]
    NotFound,
    #[error("Unable to persist reminder")]
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for CompleteReminderUseCase {
    type Response = CompletionNotice;

    type Errors = UseCaseErrors;

    const NAME: &'static str = "CompleteReminder";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Errors> {
        let mut reminder = ctx
            .repos
            .reminders
            .find(&self.reminder_id)
            .await
            .ok_or(UseCaseErrors::NotFound)?;
        if reminder.target != self.requester {
            return Err(UseCaseErrors::NotFound);
        }

        let message_id = reminder.last_sent_message_id;
        let updated_text = reminder.format_message(true);
        reminder.finish_occurrence();
        ctx.repos
            .reminders
            .save(&reminder)
            .await
            .map_err(|_| UseCaseErrors::StorageError)?;

        Ok(CompletionNotice {
            message_id,
            updated_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nudge_domain::{Recurrence, Reminder};

    async fn insert_reminder(ctx: &NudgeContext, recurrence: Recurrence) -> Reminder {
        let mut reminder = Reminder::new("77".into(), "Standup".into(), 1000, recurrence);
        reminder.send_attempts = 1;
        reminder.last_sent_at = Some(1000);
        reminder.last_sent_message_id = Some(12);
        ctx.repos.reminders.insert(&reminder).await.unwrap();
        reminder
    }

    #[tokio::test]
    async fn completing_a_once_reminder_terminates_it() {
        let ctx = NudgeContext::create_inmemory();
        let reminder = insert_reminder(&ctx, Recurrence::Once).await;

        let notice = CompleteReminderUseCase {
            reminder_id: reminder.id.clone(),
            requester: "77".into(),
        }
        .execute(&ctx)
        .await
        .expect("Completion");

        assert_eq!(notice.message_id, Some(12));
        assert!(notice.updated_text.starts_with('\u{2705}'));
        let stored = ctx.repos.reminders.find(&reminder.id).await.unwrap();
        assert!(!stored.active);
        assert_eq!(stored.next_attempt_at, None);
        assert_eq!(stored.start_time, 1000);
    }

    #[tokio::test]
    async fn completing_a_recurring_reminder_starts_a_fresh_occurrence() {
        let ctx = NudgeContext::create_inmemory();
        let reminder = insert_reminder(&ctx, Recurrence::Daily).await;

        CompleteReminderUseCase {
            reminder_id: reminder.id.clone(),
            requester: "77".into(),
        }
        .execute(&ctx)
        .await
        .expect("Completion");

        let stored = ctx.repos.reminders.find(&reminder.id).await.unwrap();
        assert!(stored.active);
        assert_eq!(stored.start_time, 1000 + 24 * 60 * 60 * 1000);
        assert_eq!(stored.next_attempt_at, Some(stored.start_time));
        assert_eq!(stored.send_attempts, 0);
        assert_eq!(stored.last_sent_message_id, None);
    }

    #[tokio::test]
    async fn rejects_completion_from_a_non_owning_identity() {
        let ctx = NudgeContext::create_inmemory();
        let reminder = insert_reminder(&ctx, Recurrence::Once).await;

        let res = CompleteReminderUseCase {
            reminder_id: reminder.id.clone(),
            requester: "99".into(),
        }
        .execute(&ctx)
        .await;

        assert!(matches!(res, Err(UseCaseErrors::NotFound)));
        let stored = ctx.repos.reminders.find(&reminder.id).await.unwrap();
        assert!(stored.active);
        assert_eq!(stored.send_attempts, 1);
        assert_eq!(stored.last_sent_message_id, Some(12));
    }

    #[tokio::test]
    async fn rejects_completion_of_an_unknown_reminder() {
        let ctx = NudgeContext::create_inmemory();
        let res = CompleteReminderUseCase {
            reminder_id: Default::default(),
            requester: "77".into(),
        }
        .execute(&ctx)
        .await;
        assert!(matches!(res, Err(UseCaseErrors::NotFound)));
    }

    #[tokio::test]
    async fn completing_an_already_terminal_once_reminder_is_safe() {
        let ctx = NudgeContext::create_inmemory();
        let reminder = insert_reminder(&ctx, Recurrence::Once).await;

        for _ in 0..2 {
            CompleteReminderUseCase {
                reminder_id: reminder.id.clone(),
                requester: "77".into(),
            }
            .execute(&ctx)
            .await
            .expect("Completion");
        }

        let stored = ctx.repos.reminders.find(&reminder.id).await.unwrap();
        assert!(!stored.active);
        assert_eq!(stored.next_attempt_at, None);
        assert_eq!(stored.start_time, 1000);
    }
}
