//! OpenAI-based brain implementation.
//!
//! Answers text and image messages through the chat-completions API. The
//! system prompt is loaded from `SYSTEM_PROMPT.md` (or `OPENAI_SYSTEM_PROMPT`)
//! and every request carries an instruction pinning the reply language.
//!
//! # Usage
//!
//! ```rust,no_run
//! use openai_brain::{Brain, InboundMessage, Language, OpenAiBrain};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let brain = OpenAiBrain::from_env()?;
//!     let reply = brain
//!         .process(InboundMessage::text(42, "What filters do you make?", Language::En))
//!         .await?;
//!     println!("{}", reply.text);
//!     Ok(())
//! }
//! ```

mod api_types;
mod brain;
mod config;

pub use brain::OpenAiBrain;
pub use config::{
    OpenAiBrainConfig, OpenAiBrainConfigBuilder, DEFAULT_API_URL, DEFAULT_IMAGE_SYSTEM_PROMPT,
    DEFAULT_MODEL, DEFAULT_PROMPT_FILE,
};

// Re-export brain-core types for convenience
pub use brain_core::{
    async_trait, Brain, BrainError, ImageInput, InboundMessage, Language, OutboundMessage,
};
