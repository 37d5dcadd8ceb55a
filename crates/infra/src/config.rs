use tracing::warn;

const DEFAULT_TICK_INTERVAL_MILLIS: u64 = 60_000;
const DEFAULT_POLLING_DELAY_MILLIS: u64 = 3_000;

#[derive(Debug, Clone)]
pub struct Config {
    /// How often the dispatch tick runs
    pub tick_interval_millis: u64,
    /// How often channel updates (completions, commands) are polled
    pub channel_polling_delay_millis: u64,
    /// Bot token for the Telegram delivery channel. Only required when the
    /// real channel is used.
    pub telegram_bot_token: Option<String>,
    pub telegram_api_url: String,
}

impl Config {
    pub fn new() -> Self {
        Self {
            tick_interval_millis: env_millis(
                "REMINDERS_TICK_INTERVAL_MILLIS",
                DEFAULT_TICK_INTERVAL_MILLIS,
            ),
            channel_polling_delay_millis: env_millis(
                "CHANNEL_POLLING_DELAY_MILLIS",
                DEFAULT_POLLING_DELAY_MILLIS,
            ),
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN").ok(),
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| crate::DEFAULT_API_URL.to_string()),
        }
    }
}

fn env_millis(var: &str, default: u64) -> u64 {
    let raw = match std::env::var(var) {
        Ok(raw) => raw,
        Err(_) => return default,
    };
    match raw.parse::<u64>() {
        Ok(millis) if millis > 0 => millis,
        _ => {
            warn!(
                "The given {}: {} is not valid, falling back to the default: {}.",
                var, raw, default
            );
            default
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
