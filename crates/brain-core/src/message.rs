//! Message types passed to and returned from a brain.

use crate::language::Language;

/// An image sent by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageInput {
    /// Raw image bytes.
    pub bytes: Vec<u8>,
    /// MIME type of the image (e.g. "image/jpeg").
    pub mime_type: String,
}

impl ImageInput {
    /// Create a JPEG image input, the format Telegram uses for photos.
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: "image/jpeg".to_string(),
        }
    }
}

impl std::fmt::Debug for ImageInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageInput")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A message to be answered by a brain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Channel (chat) the message arrived on.
    pub channel_id: i64,
    /// Text content. For image messages this is the caption, possibly empty.
    pub text: String,
    /// Attached image, if any.
    pub image: Option<ImageInput>,
    /// Language the reply must be written in.
    pub language: Language,
    /// Platform timestamp (seconds since epoch).
    pub timestamp: u64,
}

impl InboundMessage {
    /// Create a text message.
    pub fn text(channel_id: i64, text: impl Into<String>, language: Language) -> Self {
        Self {
            channel_id,
            text: text.into(),
            image: None,
            language,
            timestamp: 0,
        }
    }

    /// Create an image message with an optional caption.
    pub fn image(
        channel_id: i64,
        image: ImageInput,
        caption: impl Into<String>,
        language: Language,
    ) -> Self {
        Self {
            channel_id,
            text: caption.into(),
            image: Some(image),
            language,
            timestamp: 0,
        }
    }

    /// Set the platform timestamp.
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether this message carries an image.
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// A generated reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Channel to send the reply to.
    pub channel_id: i64,
    /// Reply text.
    pub text: String,
}

impl OutboundMessage {
    /// Create a reply to the given inbound message.
    pub fn reply_to(message: &InboundMessage, text: impl Into<String>) -> Self {
        Self {
            channel_id: message.channel_id,
            text: text.into(),
        }
    }
}
