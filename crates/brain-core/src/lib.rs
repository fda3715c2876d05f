//! Core trait and types for brain implementations.
//!
//! This crate provides the shared interface between the inbound dispatcher
//! and the completion backends of the MubAI bot. It defines:
//!
//! - [`Brain`] - The trait that all brain implementations must implement
//! - [`InboundMessage`] / [`OutboundMessage`] - Message types for input/output
//! - [`Language`] - The reply languages the bot supports
//! - [`BrainError`] - Error types for brain operations
//!
//! # Example
//!
//! ```rust
//! use brain_core::{Brain, BrainError, InboundMessage, OutboundMessage};
//! use async_trait::async_trait;
//!
//! struct MyBrain;
//!
//! #[async_trait]
//! impl Brain for MyBrain {
//!     async fn process(&self, message: InboundMessage) -> Result<OutboundMessage, BrainError> {
//!         Ok(OutboundMessage::reply_to(&message, "Hello!"))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "MyBrain"
//!     }
//! }
//! ```

mod error;
mod language;
mod message;
mod prompt;
mod trait_def;

pub use error::BrainError;
pub use language::{Language, UnknownLanguage};
pub use message::{ImageInput, InboundMessage, OutboundMessage};
pub use prompt::{hash_prompt, image_prompt, language_instruction};
pub use trait_def::Brain;

// Re-export async_trait for convenience
pub use async_trait::async_trait;
