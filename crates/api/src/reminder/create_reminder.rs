use crate::shared::usecase::UseCase;
use nudge_domain::{Recurrence, Reminder};
use nudge_infra::NudgeContext;
use thiserror::Error;

/// Saves a new reminder with freshly seeded scheduling state. A missing
/// target falls back to the configured default target.
#[derive(Debug)]
pub struct CreateReminderUseCase {
    pub target: Option<String>,
    pub title: String,
    pub description: Option<String>,
    /// UTC millis of the first firing time
    pub start_time: i64,
    pub recurrence: Recurrence,
}

#[derive(Debug, Error)]
pub enum UseCaseErrors {
    #[error("No delivery target configured")]
    NoTargetConfigured,
    #[error("Unable to persist reminder")]
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for CreateReminderUseCase {
    type Response = Reminder;

    type Errors = UseCaseErrors;

    const NAME: &'static str = "CreateReminder";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Errors> {
        let target = match self
            .target
            .as_deref()
            .filter(|target| !target.trim().is_empty())
        {
            Some(target) => target.to_string(),
            None => ctx
                .repos
                .user_settings
                .get()
                .await
                .and_then(|settings| settings.target().map(str::to_string))
                .ok_or(UseCaseErrors::NoTargetConfigured)?,
        };

        let mut reminder = Reminder::new(
            target,
            self.title.clone(),
            self.start_time,
            self.recurrence,
        );
        reminder.description = self.description.clone();
        reminder.reset_attempt_tracking();

        ctx.repos
            .reminders
            .insert(&reminder)
            .await
            .map_err(|_| UseCaseErrors::StorageError)?;

        Ok(reminder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nudge_domain::UserSettings;

    fn usecase(target: Option<String>) -> CreateReminderUseCase {
        CreateReminderUseCase {
            target,
            title: "Standup".into(),
            description: Some("bring coffee".into()),
            start_time: 1000,
            recurrence: Recurrence::Daily,
        }
    }

    #[tokio::test]
    async fn seeds_scheduling_state_on_save() {
        let ctx = NudgeContext::create_inmemory();
        let reminder = usecase(Some("77".into()))
            .execute(&ctx)
            .await
            .expect("Created reminder");

        assert_eq!(reminder.next_attempt_at, Some(1000));
        assert_eq!(reminder.send_attempts, 0);
        assert_eq!(reminder.last_sent_at, None);
        assert_eq!(reminder.last_sent_message_id, None);
        assert!(ctx.repos.reminders.find(&reminder.id).await.is_some());
    }

    #[tokio::test]
    async fn missing_target_falls_back_to_settings() {
        let ctx = NudgeContext::create_inmemory();
        let settings = UserSettings {
            target: Some("77".into()),
            ..Default::default()
        };
        ctx.repos.user_settings.save(&settings).await.unwrap();

        let reminder = usecase(None).execute(&ctx).await.expect("Created reminder");
        assert_eq!(reminder.target, "77");

        let reminder = usecase(Some("  ".into()))
            .execute(&ctx)
            .await
            .expect("Created reminder");
        assert_eq!(reminder.target, "77");
    }

    #[tokio::test]
    async fn fails_without_any_target() {
        let ctx = NudgeContext::create_inmemory();
        let res = usecase(None).execute(&ctx).await;
        assert!(matches!(res, Err(UseCaseErrors::NoTargetConfigured)));
    }
}
