//! OpenAiBrain implementation using the chat-completions API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use brain_core::{
    async_trait, hash_prompt, image_prompt, language_instruction, Brain, BrainError, ImageInput,
    InboundMessage, Language, OutboundMessage,
};
use reqwest::Client;
use tracing::{debug, info};

use crate::api_types::{
    ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ContentPart,
};
use crate::config::OpenAiBrainConfig;

/// A brain that answers with OpenAI chat completions.
///
/// Each message is answered on its own: no history is kept between
/// messages. The reply language is pinned by an instruction appended to the
/// system prompt.
pub struct OpenAiBrain {
    client: Client,
    config: OpenAiBrainConfig,
    system_prompt_hash: Option<String>,
}

impl OpenAiBrain {
    /// Create a new OpenAiBrain with the given configuration.
    pub fn new(config: OpenAiBrainConfig) -> Result<Self, BrainError> {
        if config.api_key.trim().is_empty() {
            return Err(BrainError::Configuration("API key is empty".to_string()));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| BrainError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let system_prompt_hash = config.system_prompt.as_deref().map(hash_prompt);
        if let Some(ref hash) = system_prompt_hash {
            info!("OpenAiBrain system prompt fingerprint: {}", hash);
        }

        info!("OpenAiBrain initialized with model: {}", config.model);

        Ok(Self {
            client,
            config,
            system_prompt_hash,
        })
    }

    /// Create an OpenAiBrain from environment variables.
    ///
    /// See [`OpenAiBrainConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, BrainError> {
        Self::new(OpenAiBrainConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &OpenAiBrainConfig {
        &self.config
    }

    /// Get the system prompt fingerprint, if configured.
    pub fn system_prompt_hash(&self) -> Option<&str> {
        self.system_prompt_hash.as_deref()
    }

    /// Messages for a text question.
    fn text_messages(&self, text: &str, language: Language) -> Vec<ChatMessage> {
        let instruction = language_instruction(language);
        let system = match self.config.system_prompt.as_deref() {
            Some(prompt) => format!("{}\n\n{}", prompt, instruction),
            None => instruction.to_string(),
        };

        vec![ChatMessage::system(system), ChatMessage::user(text)]
    }

    /// Messages for an image, with the caption as the question when present.
    fn image_messages(
        &self,
        image: &ImageInput,
        caption: &str,
        language: Language,
    ) -> Vec<ChatMessage> {
        let system = format!(
            "{} {}",
            self.config.image_system_prompt,
            language_instruction(language)
        );
        let question = if caption.trim().is_empty() {
            image_prompt(language).to_string()
        } else {
            caption.to_string()
        };

        vec![
            ChatMessage::system(system),
            ChatMessage::user_parts(vec![
                ContentPart::text(question),
                ContentPart::image_url(data_url(image)),
            ]),
        ]
    }

    /// Make a chat completion request.
    async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatCompletionResponse, BrainError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.api_url.trim_end_matches('/')
        );

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BrainError::Timeout
                } else {
                    BrainError::Network(format!("Failed to send request: {}", e))
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiError>(&error_text)
                .map(|api_error| api_error.error.message)
                .unwrap_or(error_text);

            if status.as_u16() == 429 || status.is_server_error() {
                return Err(BrainError::Unavailable(format!(
                    "API error ({}): {}",
                    status.as_u16(),
                    detail
                )));
            }
            return Err(BrainError::ProcessingFailed(format!(
                "API error ({}): {}",
                status.as_u16(),
                detail
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| BrainError::ProcessingFailed(format!("Failed to parse response: {}", e)))?;

        if let Some(ref usage) = completion.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        Ok(completion)
    }
}

#[async_trait]
impl Brain for OpenAiBrain {
    async fn process(&self, message: InboundMessage) -> Result<OutboundMessage, BrainError> {
        let messages = match message.image {
            Some(ref image) => {
                debug!(
                    "Processing image from channel {} ({} bytes)",
                    message.channel_id,
                    image.bytes.len()
                );
                self.image_messages(image, &message.text, message.language)
            }
            None => {
                if message.text.trim().is_empty() {
                    return Err(BrainError::ProcessingFailed(
                        "message has no text or image".to_string(),
                    ));
                }
                debug!(
                    "Processing text from channel {}: {}",
                    message.channel_id, message.text
                );
                self.text_messages(&message.text, message.language)
            }
        };

        let completion = self.chat_completion(messages).await?;

        let response_text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| BrainError::ProcessingFailed("completion had no content".to_string()))?;

        Ok(OutboundMessage::reply_to(&message, response_text))
    }

    fn name(&self) -> &str {
        "OpenAiBrain"
    }
}

/// Encode an image as a `data:` URL.
fn data_url(image: &ImageInput) -> String {
    format!("data:{};base64,{}", image.mime_type, STANDARD.encode(&image.bytes))
}
