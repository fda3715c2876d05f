//! Telegram Bot API HTTP client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::TelegramConfig;
use crate::error::TelegramError;
use crate::types::{
    ApiResponse, ChatActionParams, File, GetFileParams, GetUpdatesParams, Message, PhotoSize,
    SendMessageParams, Update, User,
};

/// Extra time a long-poll request may take beyond the poll timeout.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Client for the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    config: TelegramConfig,
    me: Arc<User>,
}

impl TelegramClient {
    /// Connect to the Bot API, verifying the token with `getMe`.
    pub async fn connect(config: TelegramConfig) -> Result<Self, TelegramError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(TelegramError::from)?;

        let me: User = call(&http, &config, "getMe", None::<&()>, None)
            .await
            .map_err(|e| match e {
                TelegramError::Http(e) => TelegramError::Connection(e.to_string()),
                other => other,
            })?;

        info!(
            "Connected to Telegram as @{} (id {})",
            me.username.as_deref().unwrap_or(&me.first_name),
            me.id
        );

        Ok(Self {
            http,
            config,
            me: Arc::new(me),
        })
    }

    /// The bot's own account.
    pub fn me(&self) -> &User {
        &self.me
    }

    /// Get the configuration.
    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        let params = GetUpdatesParams::new(offset, self.config.poll_timeout.as_secs());
        let timeout = self.config.poll_timeout + POLL_GRACE;
        self.call("getUpdates", Some(&params), Some(timeout)).await
    }

    /// Send a text message.
    pub async fn send_text(&self, chat_id: i64, text: &str) -> Result<Message, TelegramError> {
        self.send(SendMessageParams::text(chat_id, text)).await
    }

    /// Send a message using the full parameter structure.
    pub async fn send(&self, params: SendMessageParams) -> Result<Message, TelegramError> {
        self.call("sendMessage", Some(&params), None).await
    }

    /// Show the "typing" indicator in a chat.
    pub async fn send_typing(&self, chat_id: i64) -> Result<(), TelegramError> {
        let _: bool = self
            .call("sendChatAction", Some(&ChatActionParams::typing(chat_id)), None)
            .await?;
        Ok(())
    }

    /// Resolve a file id to a downloadable file.
    pub async fn get_file(&self, file_id: &str) -> Result<File, TelegramError> {
        let params = GetFileParams {
            file_id: file_id.to_string(),
        };
        self.call("getFile", Some(&params), None).await
    }

    /// Download the content of a file resolved with [`get_file`](Self::get_file).
    pub async fn download_file(&self, file: &File) -> Result<Vec<u8>, TelegramError> {
        let path = file.file_path.as_deref().ok_or_else(|| {
            TelegramError::File(format!("file {} has no download path", file.file_id))
        })?;

        let response = self.http.get(self.config.file_url(path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TelegramError::File(format!(
                "download of {} failed with HTTP {}",
                file.file_id, status
            )));
        }

        let bytes = response.bytes().await?.to_vec();
        debug!(file_id = %file.file_id, size = bytes.len(), "Downloaded file from Telegram");
        Ok(bytes)
    }

    /// Resolve and download one photo size.
    pub async fn download_photo(&self, photo: &PhotoSize) -> Result<Vec<u8>, TelegramError> {
        let file = self.get_file(&photo.file_id).await?;
        self.download_file(&file).await
    }

    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<&P>,
        timeout: Option<Duration>,
    ) -> Result<R, TelegramError> {
        call(&self.http, &self.config, method, params, timeout).await
    }
}

/// Call a Bot API method and unwrap its `ApiResponse` envelope.
async fn call<P: Serialize, R: DeserializeOwned>(
    http: &Client,
    config: &TelegramConfig,
    method: &str,
    params: Option<&P>,
    timeout: Option<Duration>,
) -> Result<R, TelegramError> {
    debug!("Bot API call: {}", method);

    let mut request = http.post(config.method_url(method));
    if let Some(params) = params {
        request = request.json(params);
    }
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    let envelope: ApiResponse<R> = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => return Err(TelegramError::Json(e)),
        Err(_) => {
            return Err(TelegramError::Api {
                code: i32::from(status.as_u16()),
                description: body,
            })
        }
    };

    if !envelope.ok {
        return Err(TelegramError::Api {
            code: envelope
                .error_code
                .unwrap_or_else(|| i32::from(status.as_u16())),
            description: envelope
                .description
                .unwrap_or_else(|| "unknown error".to_string()),
        });
    }

    envelope.result.ok_or_else(|| TelegramError::Api {
        code: -1,
        description: format!("{} returned no result", method),
    })
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("config", &self.config)
            .field("bot_id", &self.me.id)
            .finish()
    }
}
