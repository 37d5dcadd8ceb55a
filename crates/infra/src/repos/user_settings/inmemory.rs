use super::IUserSettingsRepo;
use nudge_domain::UserSettings;
use std::sync::Mutex;

pub struct InMemoryUserSettingsRepo {
    settings: Mutex<Option<UserSettings>>,
}

impl InMemoryUserSettingsRepo {
    pub fn new() -> Self {
        Self {
            settings: Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl IUserSettingsRepo for InMemoryUserSettingsRepo {
    async fn get(&self) -> Option<UserSettings> {
        self.settings.lock().unwrap().clone()
    }

    async fn save(&self, settings: &UserSettings) -> anyhow::Result<()> {
        *self.settings.lock().unwrap() = Some(settings.clone());
        Ok(())
    }
}
