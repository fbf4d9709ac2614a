//! Configuration module for Skratime.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, SkratimeError};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number for the API.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/skratime.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Empty disables file logging.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/skratime.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// JWT secret key.
    #[serde(default)]
    pub jwt_secret: String,
    /// Access and id token expiry in seconds.
    #[serde(default = "default_jwt_access_expiry")]
    pub jwt_access_token_expiry_secs: u64,
    /// Refresh token expiry in days.
    #[serde(default = "default_jwt_refresh_expiry")]
    pub jwt_refresh_token_expiry_days: u64,
    /// Externally visible base URL, used to build signed media links.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

fn default_jwt_access_expiry() -> u64 {
    3600
}

fn default_jwt_refresh_expiry() -> u64 {
    30
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            jwt_secret: String::new(),
            jwt_access_token_expiry_secs: default_jwt_access_expiry(),
            jwt_refresh_token_expiry_days: default_jwt_refresh_expiry(),
            public_base_url: default_public_base_url(),
        }
    }
}

/// RSS ingestion configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Whether the background feed updater runs.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Feed URL to poll.
    #[serde(default = "default_feed_url")]
    pub url: String,
    /// Poll interval in seconds.
    #[serde(default = "default_feed_interval")]
    pub update_interval_secs: u64,
    /// `id` attribute of the element that holds the article body.
    #[serde(default = "default_article_container")]
    pub article_container_id: String,
    /// Classes of `div` elements removed from the article body.
    #[serde(default = "default_excluded_classes")]
    pub excluded_classes: Vec<String>,
    /// Whether full article text is scraped from entry links.
    #[serde(default = "default_true")]
    pub fetch_full_article: bool,
    /// Maximum response size in bytes (feed and article pages).
    #[serde(default = "default_max_body_size")]
    pub max_body_size_bytes: u64,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// User agent sent with feed and article requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_true() -> bool {
    true
}

fn default_feed_url() -> String {
    "https://feeds.feedburner.com/TheHackersNews".to_string()
}

fn default_feed_interval() -> u64 {
    120
}

fn default_article_container() -> String {
    "articlebody".to_string()
}

fn default_excluded_classes() -> Vec<String> {
    vec!["dog_two".to_string(), "separator".to_string()]
}

fn default_max_body_size() -> u64 {
    5 * 1024 * 1024
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_total_timeout() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

fn default_user_agent() -> String {
    "Skratime/0.1 (+news-ingest)".to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_feed_url(),
            update_interval_secs: default_feed_interval(),
            article_container_id: default_article_container(),
            excluded_classes: default_excluded_classes(),
            fetch_full_article: true,
            max_body_size_bytes: default_max_body_size(),
            connect_timeout_secs: default_connect_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

/// Article queue configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Messages handed to the categorizer per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Seconds a received message stays invisible to other consumers.
    #[serde(default = "default_visibility_timeout")]
    pub visibility_timeout_secs: u64,
    /// Deliveries after which a failing message is dropped.
    #[serde(default = "default_max_receive_count")]
    pub max_receive_count: i64,
    /// Seconds between polls when the queue is empty.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_batch_size() -> usize {
    10
}

fn default_visibility_timeout() -> u64 {
    120
}

fn default_max_receive_count() -> i64 {
    3
}

fn default_poll_interval() -> u64 {
    5
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            visibility_timeout_secs: default_visibility_timeout(),
            max_receive_count: default_max_receive_count(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// Text-generation endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Whether the categorizer worker runs.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Inference endpoint URL.
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    /// Model identifier sent with each request.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Bearer API key (optional).
    #[serde(default)]
    pub api_key: String,
    /// Request timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_endpoint() -> String {
    "http://localhost:8081/model/invoke".to_string()
}

fn default_model_id() -> String {
    "amazon.titan-text-express-v1".to_string()
}

fn default_llm_timeout() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_llm_endpoint(),
            model_id: default_model_id(),
            api_key: String::new(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// Speech synthesis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    /// Synthesis endpoint URL.
    #[serde(default = "default_speech_endpoint")]
    pub endpoint: String,
    /// Bearer API key (optional).
    #[serde(default)]
    pub api_key: String,
    /// Voice used when a request does not name one.
    #[serde(default = "default_voice")]
    pub default_voice: String,
    /// Engine used when a request does not name one.
    #[serde(default = "default_engine")]
    pub default_engine: String,
    /// Per-call character limit of the synthesis service.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    /// Request timeout in seconds.
    #[serde(default = "default_speech_timeout")]
    pub timeout_secs: u64,
}

fn default_speech_endpoint() -> String {
    "http://localhost:8082/v1/speech".to_string()
}

fn default_voice() -> String {
    "Joanna".to_string()
}

fn default_engine() -> String {
    "neural".to_string()
}

fn default_max_chars() -> usize {
    3000
}

fn default_speech_timeout() -> u64 {
    60
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: default_speech_endpoint(),
            api_key: String::new(),
            default_voice: default_voice(),
            default_engine: default_engine(),
            max_chars: default_max_chars(),
            timeout_secs: default_speech_timeout(),
        }
    }
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory for stored objects.
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Secret used to sign download URLs.
    #[serde(default)]
    pub signing_secret: String,
    /// Lifetime of signed URLs in seconds.
    #[serde(default = "default_url_expiry")]
    pub url_expiry_secs: u64,
}

fn default_storage_path() -> String {
    "data/objects".to_string()
}

fn default_url_expiry() -> u64 {
    3600
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            signing_secret: String::new(),
            url_expiry_secs: default_url_expiry(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// RSS ingestion configuration.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Article queue configuration.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Text-generation configuration.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Speech synthesis configuration.
    #[serde(default)]
    pub speech: SpeechConfig,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(SkratimeError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| SkratimeError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `SKRATIME_JWT_SECRET`
    /// - `SKRATIME_STORAGE_SECRET`
    /// - `SKRATIME_LLM_API_KEY`
    /// - `SKRATIME_SPEECH_API_KEY`
    /// - `SKRATIME_FEED_URL`
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        let overrides: [(&str, &mut String); 5] = [
            ("SKRATIME_JWT_SECRET", &mut self.web.jwt_secret),
            ("SKRATIME_STORAGE_SECRET", &mut self.storage.signing_secret),
            ("SKRATIME_LLM_API_KEY", &mut self.llm.api_key),
            ("SKRATIME_SPEECH_API_KEY", &mut self.speech.api_key),
            ("SKRATIME_FEED_URL", &mut self.feed.url),
        ];

        for (name, target) in overrides {
            if let Ok(value) = std::env::var(name) {
                if !value.is_empty() {
                    *target = value;
                }
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.web.jwt_secret.is_empty() {
            return Err(SkratimeError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via SKRATIME_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.storage.signing_secret.is_empty() {
            return Err(SkratimeError::Config(
                "storage signing_secret is not set. \
                 Set it in config.toml or via SKRATIME_STORAGE_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.queue.batch_size == 0 || self.queue.batch_size > 10 {
            return Err(SkratimeError::Config(
                "queue batch_size must be between 1 and 10".to_string(),
            ));
        }
        if self.speech.max_chars == 0 {
            return Err(SkratimeError::Config(
                "speech max_chars must be greater than 0".to_string(),
            ));
        }
        url::Url::parse(&self.feed.url)
            .map_err(|e| SkratimeError::Config(format!("invalid feed url: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.web.jwt_secret = "secret".to_string();
        config.storage.signing_secret = "storage-secret".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "data/skratime.db");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/skratime.log");

        assert!(config.web.cors_origins.is_empty());
        assert!(config.web.jwt_secret.is_empty());
        assert_eq!(config.web.jwt_access_token_expiry_secs, 3600);
        assert_eq!(config.web.jwt_refresh_token_expiry_days, 30);

        assert!(config.feed.enabled);
        assert_eq!(config.feed.url, "https://feeds.feedburner.com/TheHackersNews");
        assert_eq!(config.feed.update_interval_secs, 120);
        assert_eq!(config.feed.article_container_id, "articlebody");
        assert_eq!(config.feed.excluded_classes, vec!["dog_two", "separator"]);

        assert_eq!(config.queue.batch_size, 10);
        assert_eq!(config.queue.visibility_timeout_secs, 120);

        assert_eq!(config.speech.default_voice, "Joanna");
        assert_eq!(config.speech.default_engine, "neural");
        assert_eq!(config.speech.max_chars, 3000);

        assert_eq!(config.storage.url_expiry_secs, 3600);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
port = 9000

[feed]
url = "https://example.com/feed.xml"
update_interval_secs = 60

[queue]
batch_size = 5

[speech]
default_voice = "Matthew"
"#;
        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.feed.url, "https://example.com/feed.xml");
        assert_eq!(config.feed.update_interval_secs, 60);
        assert_eq!(config.feed.article_container_id, "articlebody");
        assert_eq!(config.queue.batch_size, 5);
        assert_eq!(config.queue.max_receive_count, 3);
        assert_eq!(config.speech.default_voice, "Matthew");
        assert_eq!(config.speech.default_engine, "neural");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.llm.model_id, "amazon.titan-text-express-v1");
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("[server\nport = ");
        match result {
            Err(SkratimeError::Config(msg)) => assert!(msg.contains("config parse error")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(SkratimeError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[database]\npath = \"custom.db\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.database.path, "custom.db");
    }

    #[test]
    fn test_apply_env_overrides() {
        let original = std::env::var("SKRATIME_SPEECH_API_KEY").ok();

        std::env::set_var("SKRATIME_SPEECH_API_KEY", "env-speech-key");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.speech.api_key, "env-speech-key");

        std::env::set_var("SKRATIME_SPEECH_API_KEY", "");
        let mut config = Config::default();
        config.speech.api_key = "from-file".to_string();
        config.apply_env_overrides();
        assert_eq!(config.speech.api_key, "from-file");

        match original {
            Some(val) => std::env::set_var("SKRATIME_SPEECH_API_KEY", val),
            None => std::env::remove_var("SKRATIME_SPEECH_API_KEY"),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_jwt_secret() {
        let mut config = valid_config();
        config.web.jwt_secret.clear();
        match config.validate() {
            Err(SkratimeError::Config(msg)) => assert!(msg.contains("jwt_secret")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_missing_storage_secret() {
        let mut config = valid_config();
        config.storage.signing_secret.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_batch_size_bounds() {
        let mut config = valid_config();
        config.queue.batch_size = 0;
        assert!(config.validate().is_err());
        config.queue.batch_size = 11;
        assert!(config.validate().is_err());
        config.queue.batch_size = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_feed_url() {
        let mut config = valid_config();
        config.feed.url = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
