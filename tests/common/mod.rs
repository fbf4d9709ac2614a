//! Shared helpers for the web API tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use skratime::config::Config;
use skratime::speech::{ObjectStorage, SpeechSynthesizer, Voice};
use skratime::web::{create_router, AppState};
use skratime::Database;

pub const TEST_PASSWORD: &str = "Password123";

/// Synthesizer that returns the text bytes as "audio" and records each call.
#[derive(Default)]
pub struct EchoSynthesizer {
    pub calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl SpeechSynthesizer for EchoSynthesizer {
    async fn synthesize(&self, text: &str, voice: &Voice) -> skratime::Result<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), voice.voice_id.clone()));
        Ok(text.as_bytes().to_vec())
    }
}

/// Test server over an in-memory database and a temporary media directory.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub synthesizer: Arc<EchoSynthesizer>,
    _media: TempDir,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.web.jwt_secret = "test-secret-key-for-testing-only".to_string();
    config.web.jwt_access_token_expiry_secs = 900;
    config.web.public_base_url = "http://localhost".to_string();
    config
}

pub async fn create_test_app() -> TestApp {
    let config = test_config();
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let media = TempDir::new().expect("Failed to create media dir");
    let storage = ObjectStorage::new(media.path(), "media-secret", "http://localhost", 3600)
        .expect("Failed to create storage");
    let synthesizer = Arc::new(EchoSynthesizer::default());

    let app_state = Arc::new(AppState::new(
        db.clone(),
        &config,
        storage,
        synthesizer.clone(),
    ));
    let router = create_router(app_state, &config.web.cors_origins);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        db,
        synthesizer,
        _media: media,
    }
}

/// Register an account and return the login response body.
pub async fn register_and_login(server: &TestServer, email: &str) -> Value {
    server
        .post("/api/auth/register")
        .json(&json!({
            "email": email,
            "password": TEST_PASSWORD,
            "fullName": "Test Reader"
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

/// Register a fresh account and return its access token.
pub async fn access_token(server: &TestServer) -> String {
    let body = register_and_login(server, "reader@example.com").await;
    body["accessToken"]
        .as_str()
        .expect("login returns an access token")
        .to_string()
}

/// Create a category and return its ID.
pub async fn create_category(server: &TestServer, token: &str, name: &str) -> String {
    let response = server
        .post("/api/categories")
        .authorization_bearer(token)
        .json(&json!({ "name": name, "description": format!("{name} news") }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["category"]["id"]
        .as_str()
        .expect("category id")
        .to_string()
}

/// Create a news item and return its ID.
pub async fn create_news(
    server: &TestServer,
    token: &str,
    title: &str,
    category_id: &str,
) -> String {
    let response = server
        .post("/api/news")
        .authorization_bearer(token)
        .json(&json!({
            "title": title,
            "summary": format!("Summary of {title}."),
            "category_id": category_id,
            "picture_url": "https://img.example.com/1.jpg"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"]
        .as_str()
        .expect("news id")
        .to_string()
}
