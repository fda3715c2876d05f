//! The Brain trait definition.

use async_trait::async_trait;

use crate::error::BrainError;
use crate::message::{InboundMessage, OutboundMessage};

/// A trait for turning an inbound message into a generated reply.
///
/// Implementations range from test doubles to a full completion API client.
/// This trait is object-safe and can be used with `Arc<dyn Brain>`.
#[async_trait]
pub trait Brain: Send + Sync {
    /// Generate a reply for an inbound message.
    ///
    /// The reply must be written in `message.language`.
    async fn process(&self, message: InboundMessage) -> Result<OutboundMessage, BrainError>;

    /// Get a human-readable name for this brain implementation.
    fn name(&self) -> &str;

    /// Check if the brain is ready to process messages.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }

    /// Gracefully shut down the brain.
    ///
    /// Default implementation does nothing.
    async fn shutdown(&self) -> Result<(), BrainError> {
        Ok(())
    }
}
