//! Feed Pipeline Tests
//!
//! A mocked RSS feed is ingested into the article queue and categorized by
//! a mocked model endpoint into stored news items.

use std::sync::Arc;

use httpmock::prelude::*;
use serde_json::json;

use skratime::categorizer::{Categorizer, HttpTextModel, MODEL_ID_HEADER};
use skratime::category::{CategoryRepository, NewCategory, UNCATEGORIZED};
use skratime::config::{FeedConfig, LlmConfig};
use skratime::ingest::{FeedIngestor, RssFetcher};
use skratime::news::NewsRepository;
use skratime::queue::{SqlQueue, ARTICLE_QUEUE};
use skratime::Database;

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <item>
      <title>Quantum chip unveiled</title>
      <description><![CDATA[<p>A new <b>quantum</b> processor.</p>]]></description>
      <link>https://news.example.com/quantum</link>
      <pubDate>Mon, 01 Jan 2024 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Robots learn to walk</title>
      <description>Legged robots get better.</description>
      <link>https://news.example.com/robots</link>
      <pubDate>Tue, 02 Jan 2024 10:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

struct Pipeline {
    db: Database,
    queue: Arc<SqlQueue>,
    ingestor: FeedIngestor,
}

async fn pipeline(feed_url: String) -> Pipeline {
    let db = Database::open_in_memory().await.unwrap();
    let queue = Arc::new(SqlQueue::new(db.pool().clone(), ARTICLE_QUEUE, 30));

    let config = FeedConfig {
        url: feed_url,
        fetch_full_article: false,
        ..FeedConfig::default()
    };
    let fetcher = Arc::new(RssFetcher::new(&config).unwrap());
    let ingestor = FeedIngestor::new(db.pool().clone(), fetcher, queue.clone(), config);

    Pipeline {
        db,
        queue,
        ingestor,
    }
}

fn categorizer(db: &Database, queue: Arc<SqlQueue>, endpoint: String) -> Categorizer {
    let config = LlmConfig {
        enabled: true,
        endpoint,
        model_id: "test-model".to_string(),
        ..LlmConfig::default()
    };
    let model = Arc::new(HttpTextModel::new(&config).unwrap());
    Categorizer::new(db.pool().clone(), model, queue, 3)
}

#[tokio::test]
async fn test_feed_to_categorized_news() {
    let server = MockServer::start();
    let feed = server.mock(|when, then| {
        when.method(GET).path("/feed.xml");
        then.status(200)
            .header("content-type", "application/rss+xml")
            .body(FEED);
    });
    let model = server.mock(|when, then| {
        when.method(POST)
            .path("/invoke")
            .header(MODEL_ID_HEADER, "test-model");
        then.status(200)
            .json_body(json!({ "results": [{ "outputText": " Technology\n" }] }));
    });

    let p = pipeline(server.url("/feed.xml")).await;
    let tech = CategoryRepository::new(p.db.pool())
        .create(&NewCategory::new("Technology"))
        .await
        .unwrap();

    let report = p.ingestor.run_once().await.unwrap();
    assert_eq!(report.processed, 2);
    assert_eq!(p.queue.len().await.unwrap(), 2);

    // The watermark now covers both entries.
    let report = p.ingestor.run_once().await.unwrap();
    assert_eq!(report.processed, 0);
    assert_eq!(report.skipped, 2);
    feed.assert_hits(2);

    let categorizer = categorizer(&p.db, p.queue.clone(), server.url("/invoke"));
    let batch = categorizer.process_batch(10).await.unwrap();
    assert_eq!(batch.received, 2);
    assert_eq!(batch.stored, 2);
    model.assert_hits(2);
    assert!(p.queue.is_empty().await.unwrap());

    let items = NewsRepository::new(p.db.pool())
        .latest_in_category(&tech.id, 10)
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
    let quantum = items
        .iter()
        .find(|i| i.title == "Quantum chip unveiled")
        .unwrap();
    assert_eq!(quantum.summary, "A new quantum processor.");
    assert_eq!(quantum.news_link, "https://news.example.com/quantum");
}

#[tokio::test]
async fn test_model_failure_falls_back_to_uncategorized() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/feed.xml");
        then.status(200).body(FEED);
    });
    server.mock(|when, then| {
        when.method(POST).path("/invoke");
        then.status(500);
    });

    let p = pipeline(server.url("/feed.xml")).await;
    CategoryRepository::new(p.db.pool())
        .create(&NewCategory::new("Technology"))
        .await
        .unwrap();
    p.ingestor.run_once().await.unwrap();

    let categorizer = categorizer(&p.db, p.queue.clone(), server.url("/invoke"));
    let batch = categorizer.process_batch(10).await.unwrap();
    assert_eq!(batch.stored, 2);

    let items = NewsRepository::new(p.db.pool())
        .latest_in_category(UNCATEGORIZED, 10)
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn test_feed_failure_keeps_watermark() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/feed.xml");
        then.status(503);
    });

    let p = pipeline(server.url("/feed.xml")).await;
    assert!(p.ingestor.run_once().await.is_err());
    assert!(p.queue.is_empty().await.unwrap());
    assert!(
        skratime::ingest::WatermarkRepository::new(p.db.pool())
            .get()
            .await
            .unwrap()
            .is_none()
    );
}
