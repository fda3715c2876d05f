//! Field validation for conversation records.

use std::fmt;

use crate::models::NewConversation;

/// Maximum allowed length for the optional user display fields.
pub const MAX_NAME_LENGTH: usize = 256;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

/// All field-level failures found on one record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// The individual field errors.
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether any field failed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate a record before it is written.
///
/// Checks:
/// - `question` and `answer` are present (not blank)
/// - optional name fields are not longer than [`MAX_NAME_LENGTH`]
pub fn validate_conversation(record: &NewConversation) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if record.question.trim().is_empty() {
        errors.push("question", "is required");
    }
    if record.answer.trim().is_empty() {
        errors.push("answer", "is required");
    }

    let names = [
        ("username", &record.username),
        ("first_name", &record.first_name),
        ("last_name", &record.last_name),
    ];
    for (field, value) in names {
        if let Some(value) = value {
            let len = value.chars().count();
            if len > MAX_NAME_LENGTH {
                errors.push(
                    field,
                    format!("is too long ({} chars, max {})", len, MAX_NAME_LENGTH),
                );
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
