//! Best-effort conversation persistence for MubAI.
//!
//! Every question/answer exchange the bot completes is appended to a
//! conversation store. Persistence is advisory: the bot keeps replying when
//! the store is down, records written meanwhile are dropped, and the
//! connection is re-established lazily.
//!
//! - [`ConnectionManager`] owns the single store connection and its
//!   [`ConnectionState`].
//! - [`ConversationRecorder`] writes records, connecting on demand.
//! - [`ConversationReader`] queries records, returning empty results while
//!   disconnected.
//!
//! # Example
//!
//! ```no_run
//! use database::{
//!     ChannelType, ConnectionManager, ConversationReader, ConversationRecorder,
//!     Language, NewConversation, StoreOptions, DEFAULT_LIMIT,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = ConnectionManager::sqlite(StoreOptions::new("sqlite:mubai.db?mode=rwc"));
//!     if let Err(e) = manager.connect().await {
//!         eprintln!("running without persistence: {e}");
//!     }
//!
//!     let recorder = ConversationRecorder::new(manager.clone());
//!     recorder
//!         .record(
//!             NewConversation::new(42, ChannelType::Private, 7, "harga filter?", "...")
//!                 .with_language(Language::Id),
//!         )
//!         .await;
//!
//!     let reader = ConversationReader::new(manager.clone());
//!     let recent = reader.by_channel(42, DEFAULT_LIMIT).await;
//!     println!("{} records", recent.len());
//!
//!     manager.shutdown().await;
//! }
//! ```

pub mod best_effort;
pub mod config;
pub mod conversation;
pub mod driver;
pub mod error;
pub mod manager;
pub mod memory;
pub mod models;
pub mod reader;
pub mod recorder;
pub mod sqlite;
pub mod state;
pub mod validation;

pub use best_effort::best_effort;
pub use config::StoreOptions;
pub use driver::{ConversationStore, DriverEvent, EventSink, StoreDriver};
pub use error::{DatabaseError, Result};
pub use manager::ConnectionManager;
pub use memory::{MemoryDriver, MemoryStore};
pub use models::{
    ChannelSummary, ChannelType, Conversation, Language, MessageKind, NewConversation,
    IMAGE_QUESTION,
};
pub use reader::{ConversationReader, DEFAULT_LIMIT};
pub use recorder::ConversationRecorder;
pub use sqlite::{Database, SqliteDriver, SqliteStore};
pub use state::ConnectionState;
pub use validation::{FieldError, ValidationErrors};
