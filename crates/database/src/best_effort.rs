//! Run store operations without letting their failures escape.

use std::future::Future;

use tracing::{error, warn};

use crate::error::{DatabaseError, Result};

/// Await `operation`, logging and absorbing any failure.
///
/// Validation failures are logged at warn with their field errors; anything
/// else is logged at error with its kind. Returns `None` on failure.
pub async fn best_effort<T, F>(operation: &'static str, fut: F) -> Option<T>
where
    F: Future<Output = Result<T>>,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(DatabaseError::Validation(errors)) => {
            warn!(
                operation,
                fields = %errors,
                "Conversation record failed validation"
            );
            None
        }
        Err(e) => {
            error!(operation, kind = e.kind(), error = %e, "Conversation store operation failed");
            None
        }
    }
}
