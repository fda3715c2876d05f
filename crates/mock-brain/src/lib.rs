//! Mock brain implementations for MubAI message dispatch.
//!
//! This crate provides mock implementations of the `Brain` trait for testing:
//! - `EchoBrain` - Echoes text back and counts calls; images answer `[image:<bytes>]`
//! - `FailingBrain` - Always fails, to exercise the fallback path
//! - `DelayedBrain` - Wraps another brain with artificial delay
//!
//! For production completions, use the `openai-brain` crate instead.
//!
//! # Example
//!
//! ```rust
//! use mock_brain::{Brain, EchoBrain, InboundMessage, Language};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_brain::BrainError> {
//!     let brain = EchoBrain::new();
//!
//!     let message = InboundMessage::text(42, "Hello!", Language::En);
//!
//!     let response = brain.process(message).await?;
//!     println!("Response: {}", response.text);
//!     Ok(())
//! }
//! ```

mod delayed;
mod echo;
mod failing;

// Re-export brain-core types for convenience
pub use brain_core::{
    async_trait, Brain, BrainError, ImageInput, InboundMessage, Language, OutboundMessage,
};

pub use delayed::DelayedBrain;
pub use echo::EchoBrain;
pub use failing::FailingBrain;
