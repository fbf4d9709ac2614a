//! Skratime News backend.
//!
//! RSS ingestion feeding an LLM categorizer through a message queue, plus a
//! JSON API for accounts, categories, news, bookmarks and spoken digests.

pub mod bookmark;
pub mod categorizer;
pub mod category;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod ingest;
pub mod logging;
pub mod news;
pub mod queue;
pub mod speech;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use error::{Result, SkratimeError};
