use crate::shared::usecase::UseCase;
use nudge_domain::UserSettings;
use nudge_infra::NudgeContext;
use thiserror::Error;

/// Merges updated preferences into the singleton settings row. A blank
/// incoming target keeps the stored one.
#[derive(Debug)]
pub struct UpdateSettingsUseCase {
    pub updated_settings: UserSettings,
}

#[derive(Debug, Error)]
pub enum UseCaseErrors {
    #[error("Unable to persist settings")]
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for UpdateSettingsUseCase {
    type Response = UserSettings;

    type Errors = UseCaseErrors;

    const NAME: &'static str = "UpdateSettings";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Errors> {
        let mut settings = ctx.repos.user_settings.get().await.unwrap_or_default();
        if let Some(target) = self.updated_settings.target() {
            settings.target = Some(target.to_string());
        }
        settings.timezone = self.updated_settings.timezone.clone();
        settings.max_retry_count = self.updated_settings.max_retry_count;
        settings.quiet_hours_start = self.updated_settings.quiet_hours_start;
        settings.quiet_hours_end = self.updated_settings.quiet_hours_end;
        settings.locale = self.updated_settings.locale.clone();
        settings.apply_defaults();

        ctx.repos
            .user_settings
            .save(&settings)
            .await
            .map_err(|_| UseCaseErrors::StorageError)?;
        Ok(settings)
    }
}
