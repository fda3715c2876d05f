//! Conversation record models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub use brain_core::Language;

use crate::error::DatabaseError;
use crate::validation::{self, ValidationErrors};

/// Question text stored for image messages that carry no caption.
pub const IMAGE_QUESTION: &str = "[Image]";

/// Kind of chat a conversation happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChannelType {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Private => "private",
            ChannelType::Group => "group",
            ChannelType::Supergroup => "supergroup",
            ChannelType::Channel => "channel",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelType {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(ChannelType::Private),
            "group" => Ok(ChannelType::Group),
            "supergroup" => Ok(ChannelType::Supergroup),
            "channel" => Ok(ChannelType::Channel),
            other => Err(DatabaseError::Decode {
                field: "channel_type",
                value: other.to_string(),
            }),
        }
    }
}

/// Kind of user input that was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
}

impl MessageKind {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MessageKind::Text),
            "image" => Ok(MessageKind::Image),
            other => Err(DatabaseError::Decode {
                field: "message_type",
                value: other.to_string(),
            }),
        }
    }
}

/// A conversation exchange about to be written.
///
/// Timestamps and the record id are assigned by the store at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConversation {
    /// Chat the exchange happened in.
    pub channel_id: i64,
    /// Kind of chat.
    pub channel_type: ChannelType,
    /// User who asked.
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// User input, or [`IMAGE_QUESTION`] for uncaptioned images.
    pub question: String,
    /// Generated reply.
    pub answer: String,
    pub message_type: MessageKind,
    pub language: Language,
}

impl NewConversation {
    /// Create a text exchange in the default language.
    pub fn new(
        channel_id: i64,
        channel_type: ChannelType,
        user_id: i64,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            channel_id,
            channel_type,
            user_id,
            username: None,
            first_name: None,
            last_name: None,
            question: question.into(),
            answer: answer.into(),
            message_type: MessageKind::default(),
            language: Language::default(),
        }
    }

    /// Attach the user's display fields.
    pub fn with_user_names(
        mut self,
        username: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Self {
        self.username = username;
        self.first_name = first_name;
        self.last_name = last_name;
        self
    }

    /// Set the message kind.
    pub fn with_message_type(mut self, message_type: MessageKind) -> Self {
        self.message_type = message_type;
        self
    }

    /// Set the detected language.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Check required fields before writing.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validation::validate_conversation(self)
    }
}

/// A persisted conversation exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Auto-assigned record id.
    pub id: i64,
    pub channel_id: i64,
    pub channel_type: ChannelType,
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub question: String,
    pub answer: String,
    pub message_type: MessageKind,
    pub language: Language,
    /// When the exchange was written; retrieval order key.
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Build a stored record from a new one, as a store does on insert.
    pub fn from_new(id: i64, record: NewConversation, now: DateTime<Utc>) -> Self {
        Self {
            id,
            channel_id: record.channel_id,
            channel_type: record.channel_type,
            user_id: record.user_id,
            username: record.username,
            first_name: record.first_name,
            last_name: record.last_name,
            question: record.question,
            answer: record.answer,
            message_type: record.message_type,
            language: record.language,
            timestamp: now,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Raw row as stored in SQLite.
#[derive(Debug, FromRow)]
pub(crate) struct ConversationRow {
    pub id: i64,
    pub channel_id: i64,
    pub channel_type: String,
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub question: String,
    pub answer: String,
    pub message_type: String,
    pub language: String,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ConversationRow> for Conversation {
    type Error = DatabaseError;

    fn try_from(row: ConversationRow) -> Result<Self, Self::Error> {
        let language = row
            .language
            .parse::<Language>()
            .map_err(|_| DatabaseError::Decode {
                field: "language",
                value: row.language.clone(),
            })?;

        Ok(Self {
            id: row.id,
            channel_id: row.channel_id,
            channel_type: row.channel_type.parse()?,
            user_id: row.user_id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            question: row.question,
            answer: row.answer,
            message_type: row.message_type.parse()?,
            language,
            timestamp: row.timestamp,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Recent activity in one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelSummary {
    pub channel_id: i64,
    /// Number of recent records fetched for the channel.
    pub conversation_count: usize,
    /// Most recent record, if any.
    pub latest: Option<Conversation>,
}
