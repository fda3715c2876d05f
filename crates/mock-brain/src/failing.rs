//! Failing brain implementation - every request errors.

use brain_core::{async_trait, Brain, BrainError, InboundMessage, OutboundMessage};

/// A brain whose completions always fail.
///
/// Stands in for an unreachable completion API.
#[derive(Debug, Clone)]
pub struct FailingBrain {
    reason: String,
}

impl FailingBrain {
    /// Create a failing brain with the given failure reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for FailingBrain {
    fn default() -> Self {
        Self::new("completion API unavailable")
    }
}

#[async_trait]
impl Brain for FailingBrain {
    async fn process(&self, _message: InboundMessage) -> Result<OutboundMessage, BrainError> {
        Err(BrainError::Unavailable(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "FailingBrain"
    }

    async fn is_ready(&self) -> bool {
        false
    }
}
