use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::Connection;
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use glowbot::bot::{self, App};
use glowbot::catalog;
use glowbot::config::Config;
use glowbot::db;
use glowbot::graph::DialogGraph;
use glowbot::health;
use glowbot::localization::init_localization;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Starting Glowbot");

    let config = Config::from_env()?;

    init_localization().context("Failed to load locales")?;

    // The dialog graph and the catalog must agree before any session is
    // served; both checks are fatal here.
    let graph = DialogGraph::build().context("Dialog graph is malformed")?;
    catalog::validate_coverage(&graph).context("Catalog does not cover the dialog graph")?;

    info!("Initializing database at: {}", config.database_url);
    let conn = Connection::open(&config.database_url)?;
    db::init_database_schema(&conn)?;

    let health_port = config.health_port;
    tokio::spawn(async move {
        if let Err(e) = health::serve(health_port).await {
            error!(error = %e, "health endpoint stopped");
        }
    });

    if let Some(url) = config.keepalive_url.clone() {
        let interval = config.keepalive_interval_secs;
        tokio::spawn(health::keep_alive(url, interval));
    }

    let bot = Bot::new(&config.bot_token);
    let app = Arc::new(App::new(config, graph, conn));

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry().branch(Update::filter_message().endpoint({
        let app = Arc::clone(&app);
        move |bot: Bot, msg: Message| {
            let app = Arc::clone(&app);
            async move { bot::message_handler(bot, msg, app).await }
        }
    }));

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
