//! News items produced by the categorizer and served by the API.

mod repository;
mod types;

pub use repository::NewsRepository;
pub use types::{NewNewsItem, NewsItem, NewsUpdate, NEWS_PAGE_SIZE};
