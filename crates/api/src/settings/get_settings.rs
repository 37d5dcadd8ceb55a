use crate::shared::usecase::UseCase;
use nudge_domain::UserSettings;
use nudge_infra::NudgeContext;
use thiserror::Error;

/// Reads the singleton settings row, filling in and persisting defaults for
/// anything missing or invalid.
#[derive(Debug)]
pub struct GetSettingsUseCase;

#[derive(Debug, Error)]
pub enum UseCaseErrors {
    #[error("Unable to persist settings")]
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for GetSettingsUseCase {
    type Response = UserSettings;

    type Errors = UseCaseErrors;

    const NAME: &'static str = "GetSettings";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Errors> {
        let mut settings = ctx.repos.user_settings.get().await.unwrap_or_default();
        if settings.apply_defaults() {
            ctx.repos
                .user_settings
                .save(&settings)
                .await
                .map_err(|_| UseCaseErrors::StorageError)?;
        }
        Ok(settings)
    }
}
