//! Japanese → Korean translation with artist-name heuristics.
pub mod google;

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::aliases::AliasMap;

pub use google::GoogleTranslate;

/// Remote machine-translation backend.
#[async_trait::async_trait]
pub trait TranslationService: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;
}

/// Result of translating one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    /// Text produced by the translation service.
    Translated(String),
    /// Text resolved locally (ASCII, alias, heuristic) without a service call.
    Kept(String),
    /// The service was called and failed; the column stays NULL for later review.
    Unavailable,
}

impl Translation {
    pub fn into_option(self) -> Option<String> {
        match self {
            Translation::Translated(s) | Translation::Kept(s) => Some(s),
            Translation::Unavailable => None,
        }
    }
}

impl fmt::Display for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Translation::Translated(s) | Translation::Kept(s) => f.write_str(s),
            Translation::Unavailable => f.write_str("(translation unavailable)"),
        }
    }
}

/// Translator for chart titles and artist names.
#[derive(Clone)]
pub struct KoreanTranslator {
    service: Arc<dyn TranslationService>,
    aliases: AliasMap,
}

impl KoreanTranslator {
    pub fn new(service: Arc<dyn TranslationService>, aliases: AliasMap) -> Self {
        Self { service, aliases }
    }

    /// Translate a song title. Pure-ASCII titles are kept as-is.
    pub async fn translate_title(&self, text: &str) -> Translation {
        if text.is_ascii() {
            return Translation::Kept(text.to_string());
        }
        self.call_service(text, "title").await
    }

    /// Resolve an artist name, in order: alias table, `한글 (Latin)` prefix,
    /// Latin/digit passthrough, machine translation.
    pub async fn translate_artist(&self, artist_ja: &str) -> Translation {
        if let Some(alias) = self.aliases.get(artist_ja) {
            return Translation::Kept(alias.to_string());
        }

        if let Some((prefix, _)) = artist_ja.split_once('(') {
            let prefix = prefix.trim();
            if prefix.chars().any(is_hangul_syllable) {
                return Translation::Kept(prefix.to_string());
            }
        }

        if artist_ja.chars().any(|ch| ('A'..='z').contains(&ch) || is_decimal_digit(ch)) {
            return Translation::Kept(artist_ja.to_string());
        }

        self.call_service(artist_ja, "artist").await
    }

    async fn call_service(&self, text: &str, field: &'static str) -> Translation {
        match self.service.translate(text, "ja", "ko").await {
            Ok(out) => Translation::Translated(out),
            Err(e) => {
                warn!(field, text, error = %e, "translation failed");
                Translation::Unavailable
            }
        }
    }
}

/// ASCII or fullwidth `0-9`. Roman numerals, fractions and `〇` do not count.
fn is_decimal_digit(ch: char) -> bool {
    ch.is_ascii_digit() || ('０'..='９').contains(&ch)
}

pub fn is_hangul_syllable(ch: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&ch)
}
