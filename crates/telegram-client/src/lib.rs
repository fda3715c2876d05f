//! Telegram Bot API client library.
//!
//! This crate provides a small async client for the Telegram Bot API over
//! HTTP. It supports:
//!
//! - Receiving updates via long polling (`getUpdates`) with backoff
//! - Sending text messages and the typing indicator
//! - Resolving and downloading photos
//!
//! # Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use telegram_client::{TelegramClient, TelegramConfig};
//!
//! # async fn example() -> Result<(), telegram_client::TelegramError> {
//! let client = TelegramClient::connect(TelegramConfig::from_env()?).await?;
//!
//! let mut updates = telegram_client::subscribe(&client);
//! while let Some(result) = updates.next().await {
//!     match result {
//!         Ok(update) => {
//!             if let Some(text) = update.message.as_ref().and_then(|m| m.text()) {
//!                 println!("{}", text);
//!             }
//!         }
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod poll;
pub mod types;

pub use client::TelegramClient;
pub use config::{TelegramConfig, DEFAULT_API_URL, DEFAULT_POLL_TIMEOUT};
pub use error::TelegramError;
pub use poll::{subscribe, subscribe_with_reconnect, ReconnectConfig, UpdateStream};
pub use types::*;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
