//! Bot API types.

mod send;
mod update;

pub use send::{ChatActionParams, GetFileParams, GetUpdatesParams, SendMessageParams};
pub use update::{ApiResponse, Chat, ChatKind, File, Message, PhotoSize, Update, User};
