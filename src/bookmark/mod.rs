//! Per-user bookmarks of news items.

mod repository;

pub use repository::{BookmarkRepository, BookmarkedNews};
