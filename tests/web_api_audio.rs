//! Web API Audio Tests
//!
//! Spoken digests and signed media downloads.

mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{access_token, create_category, create_news, create_test_app};

/// Split a signed audio URL into its path and signature parameters.
fn signed_parts(url: &str) -> (String, String, String) {
    let relative = url.strip_prefix("http://localhost").expect("public base url");
    let (path, query) = relative.split_once('?').expect("query string");
    let mut expires = String::new();
    let mut signature = String::new();
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("expires", v)) => expires = v.to_string(),
            Some(("signature", v)) => signature = v.to_string(),
            _ => {}
        }
    }
    (path.to_string(), expires, signature)
}

#[tokio::test]
async fn test_generate_audio_and_download() {
    let app = create_test_app().await;
    let token = access_token(&app.server).await;
    let category = create_category(&app.server, &token, "Economy").await;
    let first = create_news(&app.server, &token, "Budget vote", &category).await;
    let second = create_news(&app.server, &token, "Rates hold", &category).await;

    let response = app
        .server
        .post("/api/audio")
        .authorization_bearer(&token)
        .json(&json!({
            "news_ids": [first, "missing-id", second],
            "voice_id": "Matthew"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["news_items_count"], 2);
    assert_eq!(body["missing_ids"], json!(["missing-id"]));
    assert!(body["s3_key"].as_str().unwrap().starts_with("audio/"));
    assert!(body["s3_key"].as_str().unwrap().ends_with(".mp3"));
    assert!(body["expires_at"].as_str().unwrap().ends_with('Z'));

    {
        let calls = app.synthesizer.calls.lock().unwrap();
        assert!(!calls.is_empty());
        assert!(calls.iter().all(|(_, voice)| voice == "Matthew"));
        let spoken: String = calls.iter().map(|(text, _)| text.as_str()).collect();
        assert!(spoken.find("Budget vote").unwrap() < spoken.find("Rates hold").unwrap());
    }

    let (path, expires, signature) = signed_parts(body["audio_url"].as_str().unwrap());
    let media = app
        .server
        .get(&path)
        .add_query_param("expires", &expires)
        .add_query_param("signature", &signature)
        .await;
    media.assert_status_ok();
    assert_eq!(media.header("content-type"), "audio/mpeg");
    assert!(media.text().contains("Summary of Budget vote"));
}

#[tokio::test]
async fn test_media_rejects_tampered_signature() {
    let app = create_test_app().await;
    let token = access_token(&app.server).await;
    let category = create_category(&app.server, &token, "Weather").await;
    let id = create_news(&app.server, &token, "Storm warning", &category).await;

    let body: Value = app
        .server
        .post("/api/audio")
        .authorization_bearer(&token)
        .json(&json!({ "news_ids": [id] }))
        .await
        .json();
    let (path, expires, signature) = signed_parts(body["audio_url"].as_str().unwrap());

    let mut tampered = signature.into_bytes();
    tampered[0] = if tampered[0] == b'0' { b'1' } else { b'0' };
    let tampered = String::from_utf8(tampered).unwrap();

    app.server
        .get(&path)
        .add_query_param("expires", &expires)
        .add_query_param("signature", &tampered)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // Extending the expiry invalidates the signature too.
    let later = (expires.parse::<i64>().unwrap() + 3600).to_string();
    app.server
        .get(&path)
        .add_query_param("expires", &later)
        .add_query_param("signature", &tampered)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .get(&path)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_generate_audio_nothing_found() {
    let app = create_test_app().await;
    let token = access_token(&app.server).await;

    let response = app
        .server
        .post("/api/audio")
        .authorization_bearer(&token)
        .json(&json!({ "news_ids": ["nope-1", "nope-2"] }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(
        body["error"]["details"]["missing_ids"],
        json!(["nope-1", "nope-2"])
    );
    assert!(app.synthesizer.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_audio_validates_ids() {
    let app = create_test_app().await;
    let token = access_token(&app.server).await;

    app.server
        .post("/api/audio")
        .authorization_bearer(&token)
        .json(&json!({ "news_ids": [] }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let too_many: Vec<String> = (0..21).map(|i| format!("id-{i}")).collect();
    app.server
        .post("/api/audio")
        .authorization_bearer(&token)
        .json(&json!({ "news_ids": too_many }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_audio_requires_auth() {
    let app = create_test_app().await;

    app.server
        .post("/api/audio")
        .json(&json!({ "news_ids": ["a"] }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health() {
    let app = create_test_app().await;

    let response = app.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}
