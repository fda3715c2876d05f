//! MubAI Telegram assistant.
//!
//! Answers questions about MUB Filters products in English or Indonesian and
//! records each exchange in the conversation store when it is reachable.

mod config;

use std::time::Instant;

use brain_core::Brain;
use database::{ConnectionManager, StoreOptions};
use dispatcher::{Dispatcher, DispatcherConfig};
use openai_brain::OpenAiBrain;
use telegram_client::{TelegramClient, TelegramConfig};
use tracing::{error, info, warn};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let started = Instant::now();

    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Missing required settings stop the process here
    let config = Config::from_env()?;
    let store_options = StoreOptions::from_env()?;
    let telegram_config = TelegramConfig::from_env()?;
    let dispatcher_config = DispatcherConfig::from_env()?;
    let brain = OpenAiBrain::from_env()?;

    let manager = ConnectionManager::sqlite(store_options);
    match manager.connect().await {
        Ok(()) => info!("Conversation store connected"),
        Err(e) => warn!(
            "Conversation store unavailable, running without history: {}",
            e
        ),
    }

    let status_addr = config.status_addr;
    let status_manager = manager.clone();
    let status_server = tokio::spawn(async move {
        if let Err(e) = status_web::serve(status_addr, status_manager, started).await {
            error!("Status server stopped: {}", e);
        }
    });

    let client = TelegramClient::connect(telegram_config).await?;

    info!("Starting MubAI with brain: {}", brain.name());
    let dispatcher = Dispatcher::new(
        brain,
        client.clone(),
        database::ConversationRecorder::new(manager.clone()),
        dispatcher_config,
    );

    let updates = telegram_client::subscribe(&client);
    let result = dispatcher
        .run_with_shutdown(updates, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    manager.shutdown().await;
    status_server.abort();
    info!("MubAI stopped");

    result?;
    Ok(())
}
