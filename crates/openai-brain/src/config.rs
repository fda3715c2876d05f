//! Configuration for OpenAiBrain.

use brain_core::BrainError;
use std::env;
use std::path::Path;

/// Default system prompt file name.
pub const DEFAULT_PROMPT_FILE: &str = "SYSTEM_PROMPT.md";

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "https://api.openai.com";

/// Default model, used for both text and image requests.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// System prompt used for image requests when none is configured.
pub const DEFAULT_IMAGE_SYSTEM_PROMPT: &str = "You are MubAI, an intelligent assistant for \
PT Mulia Usaha Bersama (MUB Filters), a leading cigarette filter manufacturer in Indonesia. \
Analyze images and provide helpful insights related to cigarette filters, production equipment, \
or any inquiries from customers. Use plain text only without any formatting like bold, italic, \
or special characters.";

/// Configuration for OpenAiBrain.
#[derive(Debug, Clone)]
pub struct OpenAiBrainConfig {
    /// API base URL (without `/v1`).
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model name to use.
    pub model: String,

    /// System prompt for text messages.
    pub system_prompt: Option<String>,

    /// System prompt for image messages.
    pub image_system_prompt: String,

    /// Maximum tokens for response.
    pub max_tokens: Option<u32>,

    /// Temperature for generation (0.0 - 2.0). Unset leaves the API default.
    pub temperature: Option<f32>,
}

impl Default for OpenAiBrainConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            image_system_prompt: DEFAULT_IMAGE_SYSTEM_PROMPT.to_string(),
            max_tokens: Some(1024),
            temperature: None,
        }
    }
}

impl OpenAiBrainConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `OPENAI_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `OPENAI_API_URL` - API URL (default: https://api.openai.com)
    /// - `OPENAI_MODEL` - Model name (default: gpt-4o-mini)
    /// - `OPENAI_SYSTEM_PROMPT` - System prompt (overrides prompt file)
    /// - `OPENAI_PROMPT_FILE` - Path to system prompt file (default: SYSTEM_PROMPT.md)
    /// - `OPENAI_IMAGE_SYSTEM_PROMPT` - System prompt for images
    /// - `OPENAI_MAX_TOKENS` - Max tokens (default: 1024)
    /// - `OPENAI_TEMPERATURE` - Temperature (default: unset)
    ///
    /// System prompt priority:
    /// 1. `OPENAI_SYSTEM_PROMPT` env var (if set)
    /// 2. Contents of prompt file (if exists)
    /// 3. None
    pub fn from_env() -> Result<Self, BrainError> {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| BrainError::Configuration("OPENAI_API_KEY not set".to_string()))?;

        let api_url = env::var("OPENAI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let model = env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let system_prompt = if let Ok(prompt) = env::var("OPENAI_SYSTEM_PROMPT") {
            Some(prompt)
        } else {
            let prompt_file = env::var("OPENAI_PROMPT_FILE")
                .unwrap_or_else(|_| DEFAULT_PROMPT_FILE.to_string());
            load_prompt_file(&prompt_file)
        };

        let image_system_prompt = env::var("OPENAI_IMAGE_SYSTEM_PROMPT")
            .unwrap_or_else(|_| DEFAULT_IMAGE_SYSTEM_PROMPT.to_string());

        let max_tokens = env::var("OPENAI_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(Some(1024));

        let temperature = env::var("OPENAI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok());

        Ok(Self {
            api_url,
            api_key,
            model,
            system_prompt,
            image_system_prompt,
            max_tokens,
            temperature,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> OpenAiBrainConfigBuilder {
        OpenAiBrainConfigBuilder::default()
    }
}

/// Builder for OpenAiBrainConfig.
#[derive(Debug, Default)]
pub struct OpenAiBrainConfigBuilder {
    config: OpenAiBrainConfig,
}

impl OpenAiBrainConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the system prompt.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Set the image system prompt.
    pub fn image_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.image_system_prompt = prompt.into();
        self
    }

    /// Set the max tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OpenAiBrainConfig {
        self.config
    }

    /// Load system prompt from a file.
    ///
    /// If the file exists and is non-empty, sets the system prompt.
    pub fn load_prompt_file(mut self, path: impl AsRef<Path>) -> Self {
        if let Some(prompt) = load_prompt_file(path) {
            self.config.system_prompt = Some(prompt);
        }
        self
    }
}

/// Load a prompt file, returning None if not found or empty.
fn load_prompt_file(path: impl AsRef<Path>) -> Option<String> {
    match std::fs::read_to_string(path.as_ref()) {
        Ok(content) => {
            let trimmed = content.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenAiBrainConfig::default();

        assert_eq!(config.api_url, "https://api.openai.com");
        assert!(config.api_key.is_empty());
        assert_eq!(config.model, "gpt-4o-mini");
        assert!(config.system_prompt.is_none());
        assert!(config.image_system_prompt.starts_with("You are MubAI"));
        assert_eq!(config.max_tokens, Some(1024));
        assert!(config.temperature.is_none());
    }

    #[test]
    fn test_builder_all_options() {
        let config = OpenAiBrainConfig::builder()
            .api_key("my-key")
            .api_url("https://proxy.example.com")
            .model("gpt-4o")
            .system_prompt("You are helpful")
            .image_system_prompt("Describe images")
            .max_tokens(512)
            .temperature(0.5)
            .build();

        assert_eq!(config.api_key, "my-key");
        assert_eq!(config.api_url, "https://proxy.example.com");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.system_prompt.as_deref(), Some("You are helpful"));
        assert_eq!(config.image_system_prompt, "Describe images");
        assert_eq!(config.max_tokens, Some(512));
        assert_eq!(config.temperature, Some(0.5));
    }

    #[test]
    fn test_load_missing_prompt_file() {
        let config = OpenAiBrainConfig::builder()
            .load_prompt_file("/nonexistent/SYSTEM_PROMPT.md")
            .build();
        assert!(config.system_prompt.is_none());
    }

    // Env vars are process-global, so all env scenarios run in one test.
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_all_openai_vars() {
            for key in [
                "OPENAI_API_KEY",
                "OPENAI_API_URL",
                "OPENAI_MODEL",
                "OPENAI_SYSTEM_PROMPT",
                "OPENAI_PROMPT_FILE",
                "OPENAI_IMAGE_SYSTEM_PROMPT",
                "OPENAI_MAX_TOKENS",
                "OPENAI_TEMPERATURE",
            ] {
                std::env::remove_var(key);
            }
        }

        // Missing API key
        clear_all_openai_vars();
        match OpenAiBrainConfig::from_env() {
            Err(BrainError::Configuration(msg)) => assert!(msg.contains("OPENAI_API_KEY")),
            other => panic!("Expected Configuration error, got {:?}", other.map(|_| ())),
        }

        // Only the key set
        clear_all_openai_vars();
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::set_var("OPENAI_PROMPT_FILE", "/nonexistent/prompt.md");
        let config = OpenAiBrainConfig::from_env().unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "gpt-4o-mini");
        assert!(config.system_prompt.is_none());
        assert_eq!(config.max_tokens, Some(1024));
        assert!(config.temperature.is_none());

        // Everything set
        clear_all_openai_vars();
        std::env::set_var("OPENAI_API_KEY", "sk-full");
        std::env::set_var("OPENAI_API_URL", "http://localhost:9999");
        std::env::set_var("OPENAI_MODEL", "gpt-4o");
        std::env::set_var("OPENAI_SYSTEM_PROMPT", "Test prompt");
        std::env::set_var("OPENAI_MAX_TOKENS", "2048");
        std::env::set_var("OPENAI_TEMPERATURE", "0.2");
        let config = OpenAiBrainConfig::from_env().unwrap();
        assert_eq!(config.api_url, "http://localhost:9999");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.system_prompt.as_deref(), Some("Test prompt"));
        assert_eq!(config.max_tokens, Some(2048));
        assert_eq!(config.temperature, Some(0.2));

        clear_all_openai_vars();
    }
}
