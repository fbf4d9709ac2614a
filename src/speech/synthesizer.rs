//! Hosted speech synthesis client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::SpeechConfig;
use crate::{Result, SkratimeError};

/// Voice and engine for one synthesis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub voice_id: String,
    pub engine: String,
}

/// Text-to-speech backend producing MP3 bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &Voice) -> Result<Vec<u8>>;
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    engine: &'a str,
    output_format: &'static str,
}

/// HTTP speech service client.
pub struct HttpSpeechSynthesizer {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpSpeechSynthesizer {
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SkratimeError::Speech(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: Some(config.api_key.clone()).filter(|k| !k.is_empty()),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(&self, text: &str, voice: &Voice) -> Result<Vec<u8>> {
        let body = SynthesizeRequest {
            text,
            voice_id: &voice.voice_id,
            engine: &voice.engine,
            output_format: "mp3",
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SkratimeError::Speech(format!("synthesis request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(SkratimeError::Speech(format!(
                "synthesis returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SkratimeError::Speech(format!("failed to read audio stream: {e}")))?;
        if bytes.is_empty() {
            return Err(SkratimeError::Speech("empty audio stream".into()));
        }

        tracing::debug!(chars = text.len(), bytes = bytes.len(), "Synthesized chunk");
        Ok(bytes.to_vec())
    }
}
