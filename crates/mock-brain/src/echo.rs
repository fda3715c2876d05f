//! Echo brain implementation - echoes messages back.

use std::sync::atomic::{AtomicUsize, Ordering};

use brain_core::{async_trait, Brain, BrainError, InboundMessage, OutboundMessage};

/// A brain that echoes messages back to the channel.
///
/// Image messages are answered with `[image:<bytes>]` so tests can tell the
/// two paths apart. Useful for testing the message flow without a
/// completion API.
#[derive(Debug, Default)]
pub struct EchoBrain {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
    calls: AtomicUsize,
}

impl EchoBrain {
    /// Create a new EchoBrain with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoBrain with a custom prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_brain::EchoBrain;
    ///
    /// let brain = EchoBrain::with_prefix("Echo: ");
    /// // Will respond with "Echo: <original message>"
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    /// Number of messages processed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Brain for EchoBrain {
    async fn process(&self, message: InboundMessage) -> Result<OutboundMessage, BrainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let body = match &message.image {
            Some(image) => format!("[image:{}]", image.bytes.len()),
            None => message.text.clone(),
        };
        let response_text = match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, body),
            None => body,
        };

        Ok(OutboundMessage::reply_to(&message, response_text))
    }

    fn name(&self) -> &str {
        "EchoBrain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brain_core::{ImageInput, Language};

    #[tokio::test]
    async fn test_echo_no_prefix() {
        let brain = EchoBrain::new();
        let msg = InboundMessage::text(42, "Hello!", Language::En);

        let response = brain.process(msg).await.unwrap();
        assert_eq!(response.text, "Hello!");
        assert_eq!(response.channel_id, 42);
        assert_eq!(brain.calls(), 1);
    }

    #[tokio::test]
    async fn test_echo_with_prefix() {
        let brain = EchoBrain::with_prefix("Echo: ");
        let msg = InboundMessage::text(42, "Hello!", Language::En);

        let response = brain.process(msg).await.unwrap();
        assert_eq!(response.text, "Echo: Hello!");
    }

    #[tokio::test]
    async fn test_echo_image() {
        let brain = EchoBrain::new();
        let msg = InboundMessage::image(42, ImageInput::jpeg(vec![0; 16]), "", Language::Id);

        let response = brain.process(msg).await.unwrap();
        assert_eq!(response.text, "[image:16]");
    }

    #[tokio::test]
    async fn test_brain_is_ready() {
        let brain = EchoBrain::new();
        assert_eq!(brain.name(), "EchoBrain");
        assert!(brain.is_ready().await);
    }
}
