//! Update and message types received from the Bot API.

use serde::{Deserialize, Serialize};

/// Envelope every Bot API method answers with.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i32>,
}

/// An incoming update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    /// Monotonic update identifier; the next poll offset is this plus one.
    pub update_id: i64,

    /// New incoming message.
    #[serde(default)]
    pub message: Option<Message>,

    /// Edited message. Not answered, but still acknowledged.
    #[serde(default)]
    pub edited_message: Option<Message>,
}

/// A message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,

    /// Send date (seconds since epoch).
    pub date: u64,

    pub chat: Chat,

    /// Sender. Absent for channel posts.
    #[serde(default)]
    pub from: Option<User>,

    #[serde(default)]
    pub text: Option<String>,

    /// Caption of a photo or document.
    #[serde(default)]
    pub caption: Option<String>,

    /// Available sizes of an attached photo.
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
}

impl Message {
    /// Text of the message, if non-empty.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Caption of the message, if non-empty.
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Whether the message text is a bot command (starts with `/`).
    pub fn is_command(&self) -> bool {
        self.text().is_some_and(|t| t.starts_with('/'))
    }

    /// Command name without the leading `/` and any `@botname` suffix.
    pub fn command(&self) -> Option<&str> {
        let text = self.text()?.strip_prefix('/')?;
        let word = text.split_whitespace().next()?;
        Some(word.split('@').next().unwrap_or(word))
    }

    /// Largest attached photo size.
    pub fn largest_photo(&self) -> Option<&PhotoSize> {
        self.photo
            .as_ref()?
            .iter()
            .max_by_key(|p| (u64::from(p.width) * u64::from(p.height), p.file_size))
    }
}

/// A chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ChatKind,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Kind of chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

/// A user or bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// One size of a photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    #[serde(default)]
    pub file_unique_id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// A file ready to be downloaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub file_id: String,
    #[serde(default)]
    pub file_unique_id: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    /// Path for the download URL. Absent when the file is too big.
    #[serde(default)]
    pub file_path: Option<String>,
}
