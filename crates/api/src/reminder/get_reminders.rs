use crate::shared::usecase::UseCase;
use nudge_domain::Reminder;
use nudge_infra::NudgeContext;

/// All reminders owned by a target, ordered by start time ascending
#[derive(Debug)]
pub struct GetRemindersUseCase {
    pub target: String,
}

#[derive(Debug)]
pub enum UseCaseErrors {}

#[async_trait::async_trait]
impl UseCase for GetRemindersUseCase {
    type Response = Vec<Reminder>;

    type Errors = UseCaseErrors;

    const NAME: &'static str = "GetReminders";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Errors> {
        Ok(ctx.repos.reminders.find_by_target(&self.target).await)
    }
}
