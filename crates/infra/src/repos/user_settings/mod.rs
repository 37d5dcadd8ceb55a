mod inmemory;
mod postgres;

pub use inmemory::InMemoryUserSettingsRepo;
use nudge_domain::UserSettings;
pub use postgres::PostgresUserSettingsRepo;

/// Persistence for the singleton `UserSettings` row
#[async_trait::async_trait]
pub trait IUserSettingsRepo: Send + Sync {
    async fn get(&self) -> Option<UserSettings>;
    async fn save(&self, settings: &UserSettings) -> anyhow::Result<()>;
}
