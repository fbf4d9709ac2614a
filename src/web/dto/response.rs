//! Response DTOs.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::bookmark::BookmarkedNews;
use crate::category::Category;
use crate::db::Page;
use crate::identity::AuthSession;
use crate::news::NewsItem;

// ============================================================================
// Generic
// ============================================================================

/// Plain message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Batch lookup result.
#[derive(Debug, Serialize)]
pub struct ItemsResponse<T: Serialize> {
    pub items: Vec<T>,
    pub count: usize,
}

impl<T: Serialize> ItemsResponse<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}

/// One page of a scan, with the token for the next page.
#[derive(Debug, Serialize)]
pub struct PageResponse<T: Serialize> {
    pub items: Vec<T>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<String>,
}

impl<T: Serialize> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        let last_evaluated_key = page.next_token();
        Self {
            count: page.items.len(),
            items: page.items,
            last_evaluated_key,
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Registration response.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    #[serde(rename = "userSub")]
    pub user_sub: String,
}

/// User summary in login responses.
#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub email: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub personal_categories: Vec<String>,
    pub notion_link: String,
    pub user_interests: Vec<String>,
}

/// Login and refresh response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub is_authenticated: bool,
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user: LoginUser,
}

impl LoginResponse {
    pub fn new(message: impl Into<String>, session: AuthSession) -> Self {
        let claims = session.id_claims;
        Self {
            message: message.into(),
            is_authenticated: true,
            access_token: session.access_token,
            id_token: session.id_token,
            refresh_token: session.refresh_token,
            expires_in: session.expires_in,
            user: LoginUser {
                email: claims.email,
                full_name: claims.name,
                personal_categories: claims.personal_categories,
                notion_link: claims.notion_link,
                user_interests: claims.user_interests,
            },
        }
    }
}

/// Personal categories update response.
#[derive(Debug, Serialize)]
pub struct PersonalCategoriesResponse {
    pub message: String,
    pub personal_categories: Vec<String>,
}

// ============================================================================
// Categories
// ============================================================================

/// Category as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
        }
    }
}

/// Category create or update response.
#[derive(Debug, Serialize)]
pub struct CategoryMutationResponse {
    pub message: String,
    pub category: CategoryResponse,
}

/// Category deletion response.
#[derive(Debug, Serialize)]
pub struct CategoryDeletedResponse {
    pub message: String,
    pub id: String,
}

/// Latest news of one category.
#[derive(Debug, Serialize)]
pub struct CategoryNews {
    pub category: CategoryResponse,
    pub news: Vec<NewsItem>,
    pub count: usize,
}

/// News grouped by category.
#[derive(Debug, Serialize)]
pub struct NewsByCategoriesResponse {
    pub categories: BTreeMap<String, CategoryNews>,
    pub total_news_count: usize,
}

// ============================================================================
// News, bookmarks
// ============================================================================

/// News creation response.
#[derive(Debug, Serialize)]
pub struct NewsCreatedResponse {
    pub message: String,
    pub id: String,
}

/// Bookmark creation response.
#[derive(Debug, Serialize)]
pub struct BookmarkResponse {
    pub message: String,
    pub user_id: String,
    pub news_id: String,
}

/// A user's bookmarks.
#[derive(Debug, Serialize)]
pub struct BookmarksResponse {
    pub bookmarks: Vec<BookmarkedNews>,
    pub count: usize,
}
