use crate::shared::usecase::UseCase;
use nudge_domain::{Reminder, ID};
use nudge_infra::NudgeContext;
use thiserror::Error;

/// Removes a reminder, but only for the identity that owns it
#[derive(Debug)]
pub struct DeleteReminderUseCase {
    pub reminder_id: ID,
    pub requester: String,
}

#[derive(Debug, Error)]
pub enum UseCaseErrors {
    #[error("Reminder not found")]
    NotFound,
}

#[async_trait::async_trait]
impl UseCase for DeleteReminderUseCase {
    type Response = Reminder;

    type Errors = UseCaseErrors;

    const NAME: &'static str = "DeleteReminder";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Errors> {
        let reminder = ctx
            .repos
            .reminders
            .find(&self.reminder_id)
            .await
            .ok_or(UseCaseErrors::NotFound)?;
        if reminder.target != self.requester {
            return Err(UseCaseErrors::NotFound);
        }
        ctx.repos
            .reminders
            .delete(&self.reminder_id)
            .await
            .ok_or(UseCaseErrors::NotFound)
    }
}
