//! Telegram update dispatcher for the MubAI bot.
//!
//! This crate connects the Telegram update stream to a [`Brain`]:
//!
//! - Detects the reply language of each text message and caches it per channel
//! - Answers `/start` with a bilingual welcome
//! - Sends text and photo messages to the brain, keeping the typing indicator alive
//! - Replies, then records the exchange through a [`ConversationRecorder`]
//! - Sends a localized fallback when no reply could be generated
//!
//! # Example
//!
//! ```ignore
//! use database::{ConnectionManager, ConversationRecorder, StoreOptions};
//! use dispatcher::Dispatcher;
//! use openai_brain::OpenAiBrain;
//! use telegram_client::{TelegramClient, TelegramConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TelegramClient::connect(TelegramConfig::from_env()?).await?;
//! let manager = ConnectionManager::sqlite(StoreOptions::from_env()?);
//! let dispatcher = Dispatcher::with_defaults(
//!     OpenAiBrain::from_env()?,
//!     client.clone(),
//!     ConversationRecorder::new(manager),
//! );
//!
//! let updates = telegram_client::subscribe(&client);
//! dispatcher
//!     .run_with_shutdown(updates, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`Brain`]: brain_core::Brain
//! [`ConversationRecorder`]: database::ConversationRecorder

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod language;
pub mod messages;
pub mod transport;

pub use config::{DispatcherConfig, DEFAULT_BRAIN_TIMEOUT, DEFAULT_TYPING_REFRESH};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::DispatchError;
pub use language::{detect_language, ChannelLanguages, ENGLISH_MARKERS, INDONESIAN_MARKERS};
pub use messages::{fallback_message, WELCOME_MESSAGE};
pub use transport::{RecordingTransport, Transport};
