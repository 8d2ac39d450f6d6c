//! Environment-based runtime configuration.

use std::env;

use anyhow::{Context, Result};

pub const DEFAULT_HEALTH_PORT: u16 = 8080;
pub const DEFAULT_KEEPALIVE_INTERVAL_SECS: u64 = 600;

/// Runtime configuration collected once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token.
    pub bot_token: String,
    /// Path of the SQLite photo database.
    pub database_url: String,
    /// Chat ids allowed into the admin menu.
    pub admin_chat_ids: Vec<i64>,
    /// Port of the liveness endpoint.
    pub health_port: u16,
    /// Public URL pinged by the keep-alive loop; disabled when unset.
    pub keepalive_url: Option<String>,
    /// Seconds between keep-alive pings.
    pub keepalive_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bot_token =
            env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let admin_chat_ids = match env::var("ADMIN_CHAT_IDS") {
            Ok(raw) => parse_admin_ids(&raw)?,
            Err(_) => Vec::new(),
        };

        let health_port = match env::var("HEALTH_PORT") {
            Ok(raw) => raw.parse().context("HEALTH_PORT must be a port number")?,
            Err(_) => DEFAULT_HEALTH_PORT,
        };

        let keepalive_url = env::var("KEEPALIVE_URL").ok().filter(|u| !u.is_empty());
        let keepalive_interval_secs = match env::var("KEEPALIVE_INTERVAL_SECS") {
            Ok(raw) => raw
                .parse()
                .context("KEEPALIVE_INTERVAL_SECS must be a number of seconds")?,
            Err(_) => DEFAULT_KEEPALIVE_INTERVAL_SECS,
        };

        Ok(Self {
            bot_token,
            database_url,
            admin_chat_ids,
            health_port,
            keepalive_url,
            keepalive_interval_secs,
        })
    }

    pub fn is_admin(&self, chat_id: i64) -> bool {
        self.admin_chat_ids.contains(&chat_id)
    }
}

fn parse_admin_ids(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .with_context(|| format!("ADMIN_CHAT_IDS contains a non-numeric id: {part}"))
        })
        .collect()
}
