//! Fixed user-facing texts.

use brain_core::Language;

/// Reply to `/start`, in both supported languages.
pub const WELCOME_MESSAGE: &str = "Hi I'm MubAI, how can I assist you today?\n\n\
Hai saya MubAI, bagaimana saya bisa membantu Anda hari ini?";

/// Sent when no reply could be generated.
pub fn fallback_message(language: Language) -> &'static str {
    match language {
        Language::Id => "Maaf, terjadi kesalahan. Silakan coba lagi.",
        Language::En => "Sorry, an error occurred. Please try again.",
    }
}
