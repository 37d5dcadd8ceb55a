mod config;
mod repos;
mod services;
mod system;

pub use config::Config;
pub use repos::{IReminderRepo, IUserSettingsRepo, Repos};
pub use services::*;
use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
pub use system::{FixedSys, ISys, RealSys};

#[derive(Clone)]
pub struct NudgeContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub channel: Arc<dyn IDeliveryChannel>,
}

struct ContextParams {
    pub postgres_connection_string: String,
}

impl NudgeContext {
    async fn create(params: ContextParams) -> Self {
        let repos = Repos::create_postgres(&params.postgres_connection_string)
            .await
            .expect("Postgres credentials must be set and valid");
        let config = Config::new();
        let token = config
            .telegram_bot_token
            .clone()
            .expect("TELEGRAM_BOT_TOKEN env var to be present.");
        let channel = Arc::new(TelegramChannel::new(token, config.telegram_api_url.clone()));
        Self {
            repos,
            config,
            sys: Arc::new(RealSys {}),
            channel,
        }
    }

    /// Context backed by inmemory repos and the recording channel double.
    /// Used by tests and available for local development.
    pub fn create_inmemory() -> Self {
        Self {
            repos: Repos::create_inmemory(),
            config: Config::new(),
            sys: Arc::new(RealSys {}),
            channel: Arc::new(InMemoryDeliveryChannel::new()),
        }
    }

    pub fn with_channel(mut self, channel: Arc<dyn IDeliveryChannel>) -> Self {
        self.channel = channel;
        self
    }

    pub fn with_sys(mut self, sys: Arc<dyn ISys>) -> Self {
        self.sys = sys;
        self
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> NudgeContext {
    NudgeContext::create(ContextParams {
        postgres_connection_string: get_psql_connection_string(),
    })
    .await
}

fn get_psql_connection_string() -> String {
    const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

    std::env::var(PSQL_CONNECTION_STRING)
        .unwrap_or_else(|_| panic!("{} env var to be present.", PSQL_CONNECTION_STRING))
}

pub async fn run_migration() -> Result<(), MigrateError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&get_psql_connection_string())
        .await
        .expect("TO CONNECT TO POSTGRES");

    sqlx::migrate!().run(&pool).await
}
