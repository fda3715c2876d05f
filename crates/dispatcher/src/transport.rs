//! Outbound transport used by the dispatcher.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use telegram_client::{PhotoSize, TelegramClient, TelegramError};

/// Sending side of the chat platform.
///
/// Abstracted so the dispatcher can be driven without a live Bot API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a text message to a chat.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TelegramError>;

    /// Show the typing indicator in a chat.
    async fn send_typing(&self, chat_id: i64) -> Result<(), TelegramError>;

    /// Fetch the bytes of a photo.
    async fn download_photo(&self, photo: &PhotoSize) -> Result<Vec<u8>, TelegramError>;
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        TelegramClient::send_text(self, chat_id, text).await.map(|_| ())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<(), TelegramError> {
        TelegramClient::send_typing(self, chat_id).await
    }

    async fn download_photo(&self, photo: &PhotoSize) -> Result<Vec<u8>, TelegramError> {
        TelegramClient::download_photo(self, photo).await
    }
}

/// A transport that records what would have been sent.
///
/// Photos download as a fixed three-byte JPEG header.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(i64, String)>>,
    typing: AtomicUsize,
    fail_sends: AtomicBool,
    fail_downloads: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent text sends fail.
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent photo downloads fail.
    pub fn set_fail_downloads(&self, fail: bool) {
        self.fail_downloads.store(fail, Ordering::SeqCst);
    }

    /// Messages sent so far, as `(chat_id, text)`.
    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of typing indicators sent so far.
    pub fn typing_count(&self) -> usize {
        self.typing.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TelegramError::Api {
                code: 403,
                description: "Forbidden: bot was blocked by the user".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((chat_id, text.to_string()));
        Ok(())
    }

    async fn send_typing(&self, _chat_id: i64) -> Result<(), TelegramError> {
        self.typing.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn download_photo(&self, photo: &PhotoSize) -> Result<Vec<u8>, TelegramError> {
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(TelegramError::File(format!(
                "download of {} failed with HTTP 404",
                photo.file_id
            )));
        }
        Ok(vec![0xff, 0xd8, 0xff])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_transport() {
        let transport = RecordingTransport::new();

        transport.send_text(1, "hello").await.unwrap();
        transport.send_typing(1).await.unwrap();
        assert_eq!(transport.sent(), vec![(1, "hello".to_string())]);
        assert_eq!(transport.typing_count(), 1);

        transport.set_fail_sends(true);
        assert!(transport.send_text(1, "again").await.is_err());
        assert_eq!(transport.sent().len(), 1);
    }
}
