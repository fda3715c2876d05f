//! Request parameter types for Bot API methods.

use serde::Serialize;

/// Parameters for `sendMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageParams {
    pub chat_id: i64,
    pub text: String,
    /// Message to reply to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
}

impl SendMessageParams {
    /// Create a plain text message.
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            reply_to_message_id: None,
        }
    }

    /// Reply to a specific message.
    pub fn replying_to(mut self, message_id: i64) -> Self {
        self.reply_to_message_id = Some(message_id);
        self
    }
}

/// Parameters for `sendChatAction`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatActionParams {
    pub chat_id: i64,
    /// Action name, e.g. "typing".
    pub action: &'static str,
}

impl ChatActionParams {
    /// "typing" action, shown for about five seconds.
    pub fn typing(chat_id: i64) -> Self {
        Self {
            chat_id,
            action: "typing",
        }
    }
}

/// Parameters for `getUpdates`.
#[derive(Debug, Clone, Serialize)]
pub struct GetUpdatesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// Long-poll timeout in seconds.
    pub timeout: u64,
    pub allowed_updates: Vec<&'static str>,
}

impl GetUpdatesParams {
    pub fn new(offset: Option<i64>, timeout_secs: u64) -> Self {
        Self {
            offset,
            timeout: timeout_secs,
            allowed_updates: vec!["message"],
        }
    }
}

/// Parameters for `getFile`.
#[derive(Debug, Clone, Serialize)]
pub struct GetFileParams {
    pub file_id: String,
}
