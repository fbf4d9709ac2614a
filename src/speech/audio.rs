//! Audio digests: news text to a single signed MP3.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::storage::ObjectStorage;
use super::synthesizer::{SpeechSynthesizer, Voice};
use crate::config::SpeechConfig;
use crate::db::DbPool;
use crate::news::{NewsItem, NewsRepository};
use crate::SkratimeError;

/// Maximum number of news items per request.
pub const MAX_AUDIO_ITEMS: usize = 20;

/// Separator spoken between articles by default.
pub const DEFAULT_SEPARATOR: &str = "Next article.";

/// Content type of generated audio.
pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

const WORDS_PER_MINUTE: usize = 150;

/// Audio generation failures.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("{0}")]
    Invalid(String),

    #[error("None of the requested news items were found")]
    NothingFound { missing_ids: Vec<String> },

    #[error("No text content found in the requested news items")]
    EmptyText,

    #[error(transparent)]
    Internal(#[from] SkratimeError),
}

/// Audio generation request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AudioRequest {
    pub news_ids: Vec<String>,
    pub voice_id: Option<String>,
    pub engine: Option<String>,
    pub separator_text: Option<String>,
}

/// Generated audio digest.
#[derive(Debug, Clone, Serialize)]
pub struct AudioResult {
    pub audio_url: String,
    pub duration_estimate_seconds: usize,
    pub news_items_count: usize,
    pub missing_ids: Vec<String>,
    pub s3_key: String,
    pub expires_at: String,
}

/// Builds audio digests from stored news items.
pub struct AudioService<'a> {
    pool: &'a DbPool,
    storage: &'a ObjectStorage,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    config: &'a SpeechConfig,
}

impl<'a> AudioService<'a> {
    pub fn new(
        pool: &'a DbPool,
        storage: &'a ObjectStorage,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        config: &'a SpeechConfig,
    ) -> Self {
        Self {
            pool,
            storage,
            synthesizer,
            config,
        }
    }

    /// Synthesize the requested items into one object and sign a URL for it.
    pub async fn generate(&self, request: &AudioRequest) -> Result<AudioResult, AudioError> {
        validate_ids(&request.news_ids)?;

        let found = NewsRepository::new(self.pool)
            .get_many(&request.news_ids)
            .await?;
        let mut items: Vec<&NewsItem> = Vec::new();
        let mut missing_ids = Vec::new();
        for id in &request.news_ids {
            match found.get(id) {
                Some(item) => items.push(item),
                None => missing_ids.push(id.clone()),
            }
        }
        if items.is_empty() {
            return Err(AudioError::NothingFound { missing_ids });
        }
        if !missing_ids.is_empty() {
            warn!(missing = ?missing_ids, "Some news items were not found");
        }

        let separator = request
            .separator_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SEPARATOR);
        let text = prepare_text(&items, separator);
        if text.is_empty() {
            return Err(AudioError::EmptyText);
        }

        let voice = Voice {
            voice_id: pick(&request.voice_id, &self.config.default_voice),
            engine: pick(&request.engine, &self.config.default_engine),
        };
        let chunks = chunk_text(&text, self.config.max_chars);
        let mut audio = Vec::new();
        for chunk in &chunks {
            audio.extend(self.synthesizer.synthesize(chunk, &voice).await?);
        }

        let now = Utc::now();
        let key = format!(
            "audio/{}_{}.mp3",
            now.format("%Y%m%d_%H%M%S"),
            uuid::Uuid::new_v4()
        );
        self.storage.put(&key, &audio, AUDIO_CONTENT_TYPE).await?;
        let signed = self.storage.signed_url_at(&key, now)?;

        let duration = estimate_duration(&text);
        info!(
            key = %key,
            items = items.len(),
            chunks = chunks.len(),
            bytes = audio.len(),
            duration_secs = duration,
            "Generated audio digest"
        );

        Ok(AudioResult {
            audio_url: signed.url,
            duration_estimate_seconds: duration,
            news_items_count: items.len(),
            missing_ids,
            s3_key: key,
            expires_at: signed.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }
}

fn validate_ids(ids: &[String]) -> Result<(), AudioError> {
    if ids.is_empty() {
        return Err(AudioError::Invalid("news_ids must be a non-empty list".into()));
    }
    if ids.len() > MAX_AUDIO_ITEMS {
        return Err(AudioError::Invalid(format!(
            "Maximum {MAX_AUDIO_ITEMS} news items allowed per request"
        )));
    }
    if ids.iter().any(|id| id.trim().is_empty()) {
        return Err(AudioError::Invalid("news_ids must be non-empty strings".into()));
    }
    Ok(())
}

fn pick(requested: &Option<String>, default: &str) -> String {
    requested
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Spoken text for a single item.
fn item_text(item: &NewsItem) -> String {
    let title = item.title.trim();
    let summary = item.summary.trim();
    match (title.is_empty(), summary.is_empty()) {
        (false, false) => format!("{title}. {summary}"),
        (false, true) => format!("{title}."),
        (true, false) => summary.to_string(),
        (true, true) => String::new(),
    }
}

/// Join item texts with the spoken separator. Items without text are skipped.
pub fn prepare_text(items: &[&NewsItem], separator: &str) -> String {
    items
        .iter()
        .map(|item| item_text(item))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(&format!(" {separator} "))
}

/// Split text into chunks of at most `max_chars` characters, on sentence
/// boundaries where possible.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if char_len(text) <= max_chars {
        return vec![text.to_string()];
    }

    let pieces = split_sentences(text)
        .into_iter()
        .flat_map(|sentence| {
            if char_len(sentence) > max_chars {
                split_words(sentence, max_chars)
            } else {
                vec![sentence.to_string()]
            }
        });
    pack(pieces, max_chars)
}

/// Rough spoken length at 150 words per minute.
pub fn estimate_duration(text: &str) -> usize {
    text.split_whitespace().count() * 60 / WORDS_PER_MINUTE
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split after `.`, `!` or `?` followed by a space.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(space, ' ')) = chars.peek() {
                sentences.push(&text[start..=i]);
                start = space + 1;
                chars.next();
            }
        }
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn split_words(sentence: &str, max_chars: usize) -> Vec<String> {
    let pieces = sentence.split_whitespace().flat_map(|word| {
        if char_len(word) > max_chars {
            let chars: Vec<char> = word.chars().collect();
            chars
                .chunks(max_chars)
                .map(|c| c.iter().collect::<String>())
                .collect()
        } else {
            vec![word.to_string()]
        }
    });
    pack(pieces, max_chars)
}

fn pack(pieces: impl IntoIterator<Item = String>, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for piece in pieces {
        if current.is_empty() {
            current = piece;
        } else if char_len(&current) + char_len(&piece) + 1 <= max_chars {
            current.push(' ');
            current.push_str(&piece);
        } else {
            chunks.push(std::mem::replace(&mut current, piece));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
