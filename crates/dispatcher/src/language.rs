//! Keyword-based reply language detection.

use std::collections::HashMap;

use brain_core::Language;
use tokio::sync::RwLock;

/// Words that mark a message as Indonesian.
pub const INDONESIAN_MARKERS: &[&str] = &[
    "apa",
    "bagaimana",
    "berapa",
    "dimana",
    "di mana",
    "kapan",
    "siapa",
    "mengapa",
    "kenapa",
    "saya",
    "kamu",
    "anda",
    "dengan",
    "untuk",
    "dari",
    "yang",
    "ini",
    "itu",
    "ada",
    "tidak",
    "bisa",
    "mau",
    "ingin",
    "terima",
    "kasih",
    "tolong",
    "mohon",
    "produk",
    "filter",
    "harga",
    "informasi",
    "tentang",
    "perusahaan",
    "pabrik",
];

/// Words that mark a message as English.
pub const ENGLISH_MARKERS: &[&str] = &[
    "what",
    "how",
    "where",
    "when",
    "who",
    "why",
    "price",
    "product",
    "please",
    "thank",
    "thanks",
    "hello",
    "hi",
    "company",
    "factory",
    "information",
];

/// Detect the reply language of `text`.
///
/// Markers match whole words, case-insensitively. Indonesian wins when both
/// languages match; with no marker at all, `default` is returned.
pub fn detect_language(text: &str, default: Language) -> Language {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    if has_marker(&words, INDONESIAN_MARKERS) {
        Language::Id
    } else if has_marker(&words, ENGLISH_MARKERS) {
        Language::En
    } else {
        default
    }
}

fn has_marker(words: &[String], markers: &[&str]) -> bool {
    markers.iter().any(|marker| {
        let parts: Vec<&str> = marker.split(' ').collect();
        words
            .windows(parts.len())
            .any(|window| window.iter().zip(&parts).all(|(w, p)| w == p))
    })
}

/// Last detected language per channel.
///
/// Image messages carry no text to detect from, so they reuse whatever the
/// channel last wrote in.
#[derive(Debug, Default)]
pub struct ChannelLanguages {
    languages: RwLock<HashMap<i64, Language>>,
}

impl ChannelLanguages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the language detected for a channel.
    pub async fn set(&self, channel_id: i64, language: Language) {
        self.languages.write().await.insert(channel_id, language);
    }

    /// Cached language for a channel.
    pub async fn get(&self, channel_id: i64) -> Option<Language> {
        self.languages.read().await.get(&channel_id).copied()
    }

    /// Cached language for a channel, or `default` if none was seen yet.
    pub async fn get_or(&self, channel_id: i64, default: Language) -> Language {
        self.get(channel_id).await.unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indonesian_markers() {
        assert_eq!(detect_language("terima kasih", Language::En), Language::Id);
        assert_eq!(detect_language("Harga filter?", Language::En), Language::Id);
        assert_eq!(detect_language("Di mana pabriknya", Language::En), Language::Id);
    }

    #[test]
    fn test_english_markers() {
        assert_eq!(detect_language("What is the price?", Language::Id), Language::En);
        assert_eq!(detect_language("hello", Language::Id), Language::En);
    }

    #[test]
    fn test_no_markers_uses_default() {
        assert_eq!(detect_language("ok 👍", Language::En), Language::En);
        assert_eq!(detect_language("ok 👍", Language::Id), Language::Id);
        assert_eq!(detect_language("", Language::Id), Language::Id);
    }

    #[test]
    fn test_markers_match_whole_words_only() {
        // "filters" and "itulah" contain markers but are not marker words
        assert_eq!(detect_language("filters itulah", Language::En), Language::En);
        assert_eq!(detect_language("dimanapun", Language::En), Language::En);
    }

    #[test]
    fn test_indonesian_wins_over_english() {
        assert_eq!(
            detect_language("Hello, berapa harga filter menthol?", Language::En),
            Language::Id
        );
    }

    #[tokio::test]
    async fn test_channel_languages() {
        let cache = ChannelLanguages::new();
        assert_eq!(cache.get(1).await, None);
        assert_eq!(cache.get_or(1, Language::En).await, Language::En);

        cache.set(1, Language::Id).await;
        assert_eq!(cache.get_or(1, Language::En).await, Language::Id);
        assert_eq!(cache.get(2).await, None);
    }
}
