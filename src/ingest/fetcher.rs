//! HTTP feed and article fetching.
//!
//! Article links come from third-party feed content, so they are checked
//! against loopback and private addresses before being fetched. The feed URL
//! itself is operator configuration and is fetched as given.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use feed_rs::parser;
use reqwest::Client;

use super::article::html_to_text;
use super::types::{ParsedEntry, ParsedFeed};
use crate::config::FeedConfig;
use crate::{Result, SkratimeError};

/// Source of feeds and article pages.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse the feed at `url`.
    async fn fetch_feed(&self, url: &str) -> Result<ParsedFeed>;

    /// Fetch the HTML of an article page.
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

/// HTTP implementation of [`FeedSource`].
pub struct RssFetcher {
    client: Client,
    max_body_size: u64,
}

impl RssFetcher {
    /// Create a fetcher with the configured timeouts and limits.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| SkratimeError::Feed(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_body_size: config.max_body_size_bytes,
        })
    }

    async fn get_limited(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SkratimeError::Feed(format!("failed to fetch {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(SkratimeError::Feed(format!(
                "HTTP error {} from {url}",
                response.status()
            )));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_body_size {
                return Err(SkratimeError::Feed(format!(
                    "response too large: {length} bytes (max {})",
                    self.max_body_size
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SkratimeError::Feed(format!("failed to read response: {e}")))?;

        if bytes.len() as u64 > self.max_body_size {
            return Err(SkratimeError::Feed(format!(
                "response too large: {} bytes (max {})",
                bytes.len(),
                self.max_body_size
            )));
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl FeedSource for RssFetcher {
    async fn fetch_feed(&self, url: &str) -> Result<ParsedFeed> {
        let bytes = self.get_limited(url).await?;
        parse_feed(&bytes)
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        validate_url(url)?;
        let bytes = self.get_limited(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Check that a URL is http(s) and does not point at a local or private host.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url).map_err(|e| SkratimeError::Feed(format!("invalid URL: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SkratimeError::Feed(format!(
            "unsupported URL scheme: {}",
            parsed.scheme()
        )));
    }

    let forbidden = match parsed.host() {
        None => return Err(SkratimeError::Feed("URL has no host".into())),
        Some(url::Host::Domain(domain)) => is_forbidden_hostname(domain),
        Some(url::Host::Ipv4(ip)) => is_private_ip(&IpAddr::V4(ip)),
        Some(url::Host::Ipv6(ip)) => is_private_ip(&IpAddr::V6(ip)),
    };
    if forbidden {
        return Err(SkratimeError::Feed(format!("forbidden host in {url}")));
    }

    Ok(())
}

fn is_forbidden_hostname(host: &str) -> bool {
    const SUFFIXES: &[&str] = &[".local", ".localhost", ".internal", ".intranet", ".lan"];

    let host = host.to_ascii_lowercase();
    host == "localhost" || SUFFIXES.iter().any(|s| host.ends_with(s))
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || v4.is_documentation()
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}

/// Parse RSS or Atom bytes.
pub fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed> {
    let feed = parser::parse(bytes)
        .map_err(|e| SkratimeError::Feed(format!("failed to parse feed: {e}")))?;

    let title = feed.title.map(|t| t.content).unwrap_or_default();
    let entries = feed.entries.into_iter().map(parse_entry).collect();

    Ok(ParsedFeed { title, entries })
}

fn parse_entry(entry: feed_rs::model::Entry) -> ParsedEntry {
    let image_url = image_link(&entry);
    let summary = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .map(|html| html_to_text(&html));

    ParsedEntry {
        title: entry.title.map(|t| t.content),
        summary,
        link: entry.links.first().map(|l| l.href.clone()),
        image_url,
        author: entry.authors.first().map(|a| a.name.clone()),
        published_at: entry.published.or(entry.updated),
    }
}

/// First image-typed link, falling back to image media content.
fn image_link(entry: &feed_rs::model::Entry) -> Option<String> {
    let is_image = |media_type: &str| media_type.starts_with("image/");

    entry
        .links
        .iter()
        .find(|l| l.media_type.as_deref().is_some_and(is_image))
        .map(|l| l.href.clone())
        .or_else(|| {
            entry
                .media
                .iter()
                .flat_map(|m| m.content.iter())
                .find(|c| {
                    c.content_type
                        .as_ref()
                        .is_some_and(|t| is_image(&t.to_string()))
                })
                .and_then(|c| c.url.as_ref().map(|u| u.to_string()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Security News</title>
    <link>https://news.example.com</link>
    <item>
      <title>Critical patch released</title>
      <link>https://news.example.com/patch</link>
      <description>&lt;p&gt;Vendors &lt;b&gt;urge&lt;/b&gt; updates.&lt;/p&gt;</description>
      <author>desk@example.com (Desk)</author>
      <pubDate>Sun, 01 Mar 2026 10:30:00 +0200</pubDate>
      <enclosure url="https://cdn.example.com/patch.jpg" length="1000" type="image/jpeg"/>
    </item>
    <item>
      <guid>bare</guid>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/a").is_ok());
        assert!(validate_url("http://172.32.0.1/a").is_ok());

        for bad in [
            "ftp://example.com/a",
            "http://localhost/a",
            "http://intranet.local/a",
            "http://127.0.0.1/a",
            "http://10.1.2.3/a",
            "http://192.168.1.1/a",
            "http://169.254.169.254/latest",
            "http://[::1]/a",
            "http://[fd00::1]/a",
            "not a url",
        ] {
            assert!(validate_url(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_parse_feed() {
        let feed = parse_feed(RSS.as_bytes()).unwrap();
        assert_eq!(feed.title, "Security News");
        assert_eq!(feed.entries.len(), 2);

        let first = &feed.entries[0];
        assert_eq!(first.title.as_deref(), Some("Critical patch released"));
        assert_eq!(first.summary.as_deref(), Some("Vendors urge updates."));
        assert_eq!(first.link.as_deref(), Some("https://news.example.com/patch"));
        assert_eq!(
            first.image_url.as_deref(),
            Some("https://cdn.example.com/patch.jpg")
        );
        assert_eq!(
            first.published_at,
            Some(Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap())
        );

        let bare = &feed.entries[1];
        assert!(bare.title.is_none());
        assert!(bare.published_at.is_none());
        assert!(bare.image_url.is_none());
    }

    #[test]
    fn test_parse_invalid_feed() {
        assert!(parse_feed(b"this is not xml").is_err());
    }

    #[tokio::test]
    async fn test_fetch_feed_over_http() {
        let server = httpmock::MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::GET).path("/feed");
                then.status(200)
                    .header("content-type", "application/rss+xml")
                    .body(RSS);
            })
            .await;

        let fetcher = RssFetcher::new(&FeedConfig::default()).unwrap();
        let feed = fetcher.fetch_feed(&server.url("/feed")).await.unwrap();
        mock.assert_async().await;
        assert_eq!(feed.entries.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_rejects_oversized_and_errors() {
        let server = httpmock::MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/big");
                then.status(200).body("x".repeat(2048));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.path("/missing");
                then.status(404);
            })
            .await;

        let config = FeedConfig {
            max_body_size_bytes: 1024,
            ..FeedConfig::default()
        };
        let fetcher = RssFetcher::new(&config).unwrap();
        assert!(fetcher.fetch_feed(&server.url("/big")).await.is_err());
        assert!(fetcher.fetch_feed(&server.url("/missing")).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_page_blocks_local_hosts() {
        let fetcher = RssFetcher::new(&FeedConfig::default()).unwrap();
        let result = fetcher.fetch_page("http://127.0.0.1:9/article").await;
        assert!(matches!(result, Err(SkratimeError::Feed(_))));
    }
}
