//! News categories.

mod repository;
mod types;

pub use repository::CategoryRepository;
pub use types::{
    Category, CategoryUpdate, NewCategory, CATEGORY_PAGE_SIZE, MAX_CATEGORY_PAGE_SIZE,
    UNCATEGORIZED,
};
