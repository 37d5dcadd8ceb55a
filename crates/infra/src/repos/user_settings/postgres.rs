use super::IUserSettingsRepo;
use nudge_domain::UserSettings;
use serde_json::Value;
use sqlx::{types::Json, FromRow, PgPool};
use tracing::error;

const SINGLETON_ID: i16 = 1;

pub struct PostgresUserSettingsRepo {
    pool: PgPool,
}

impl PostgresUserSettingsRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserSettingsRaw {
    settings: Value,
}

#[async_trait::async_trait]
impl IUserSettingsRepo for PostgresUserSettingsRepo {
    async fn get(&self) -> Option<UserSettings> {
        let res: Option<UserSettingsRaw> = sqlx::query_as(
            r#"
            SELECT settings FROM user_settings
            WHERE settings_id = $1
            "#,
        )
        .bind(SINGLETON_ID)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Find user settings failed. DB returned error: {:?}", e);
            e
        })
        .ok()?;
        res.and_then(|row| serde_json::from_value(row.settings).ok())
    }

    async fn save(&self, settings: &UserSettings) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_settings(settings_id, settings)
            VALUES($1, $2)
            ON CONFLICT (settings_id) DO UPDATE SET settings = $2
            "#,
        )
        .bind(SINGLETON_ID)
        .bind(Json(settings))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Unable to save user settings: {:?}. DB returned error: {:?}",
                settings, e
            );
            e
        })?;
        Ok(())
    }
}
