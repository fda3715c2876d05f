//! Prompt helpers shared by completion backends.

use sha2::{Digest, Sha256};

use crate::language::Language;

/// Compute a stable SHA-256 fingerprint for a prompt string.
///
/// Logged at startup so prompt revisions can be told apart without logging
/// the prompt itself.
pub fn hash_prompt(prompt: &str) -> String {
    Sha256::digest(prompt.as_bytes())
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

/// Instruction appended to the system prompt to pin the reply language.
pub fn language_instruction(language: Language) -> &'static str {
    match language {
        Language::Id => "IMPORTANT: Respond in Bahasa Indonesia (Indonesian language).",
        Language::En => "IMPORTANT: Respond in English.",
    }
}

/// User prompt sent alongside an image that has no caption.
pub fn image_prompt(language: Language) -> &'static str {
    match language {
        Language::Id => {
            "Apa yang ada di gambar ini? Mohon analisis dan berikan informasi yang relevan."
        }
        Language::En => {
            "What's in this image? Please analyze it and provide relevant information."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_prompt_stable() {
        let first = hash_prompt("test prompt");
        let second = hash_prompt("test prompt");
        let different = hash_prompt("another prompt");

        assert_eq!(first, second);
        assert_ne!(first, different);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_language_instruction() {
        assert!(language_instruction(Language::Id).contains("Bahasa Indonesia"));
        assert!(language_instruction(Language::En).contains("English"));
    }
}
