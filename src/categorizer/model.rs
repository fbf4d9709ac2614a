//! Hosted text-generation model client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::{Result, SkratimeError};

/// Header naming the model to invoke.
pub const MODEL_ID_HEADER: &str = "x-model-id";

/// Text completion model.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Complete `prompt`, returning the raw generated text.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_token_count: u32,
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InvokeRequest<'a> {
    input_text: &'a str,
    text_generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    results: Vec<InvokeResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvokeResult {
    #[serde(default)]
    output_text: String,
}

/// HTTP client for a Titan-style inference endpoint.
pub struct HttpTextModel {
    client: Client,
    endpoint: String,
    model_id: String,
    api_key: Option<String>,
}

impl HttpTextModel {
    /// Create a client from configuration.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SkratimeError::Model(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model_id: config.model_id.clone(),
            api_key: Some(config.api_key.clone()).filter(|k| !k.is_empty()),
        })
    }
}

#[async_trait]
impl TextModel for HttpTextModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = InvokeRequest {
            input_text: prompt,
            text_generation_config: GenerationConfig {
                max_token_count: 20,
                temperature: 0.2,
                top_p: 0.9,
            },
        };

        let mut request = self
            .client
            .post(&self.endpoint)
            .header(MODEL_ID_HEADER, &self.model_id)
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SkratimeError::Model(format!("invocation failed: {e}")))?;
        if !response.status().is_success() {
            return Err(SkratimeError::Model(format!(
                "invocation returned {}",
                response.status()
            )));
        }

        let payload: InvokeResponse = response
            .json()
            .await
            .map_err(|e| SkratimeError::Model(format!("invalid response body: {e}")))?;

        Ok(payload
            .results
            .into_iter()
            .next()
            .map(|r| r.output_text.trim().to_string())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn config(endpoint: String) -> LlmConfig {
        LlmConfig {
            endpoint,
            api_key: "key-1".to_string(),
            ..LlmConfig::default()
        }
    }

    #[tokio::test]
    async fn test_generate_sends_titan_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/invoke")
                    .header("authorization", "Bearer key-1")
                    .header(MODEL_ID_HEADER, "amazon.titan-text-express-v1")
                    .json_body(json!({
                        "inputText": "Summary: x\nCategory:",
                        "textGenerationConfig": {
                            "maxTokenCount": 20,
                            "temperature": 0.2,
                            "topP": 0.9
                        }
                    }));
                then.status(200)
                    .json_body(json!({"results": [{"outputText": "  Malware\n"}]}));
            })
            .await;

        let model = HttpTextModel::new(&config(server.url("/invoke"))).unwrap();
        let output = model.generate("Summary: x\nCategory:").await.unwrap();
        mock.assert_async().await;
        assert_eq!(output, "Malware");
    }

    #[tokio::test]
    async fn test_generate_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/fail");
                then.status(500);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.path("/empty");
                then.status(200).json_body(json!({"results": []}));
            })
            .await;

        let failing = HttpTextModel::new(&config(server.url("/fail"))).unwrap();
        assert!(matches!(
            failing.generate("p").await,
            Err(SkratimeError::Model(_))
        ));

        let empty = HttpTextModel::new(&config(server.url("/empty"))).unwrap();
        assert_eq!(empty.generate("p").await.unwrap(), "");
    }
}
