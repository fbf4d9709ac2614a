//! Request DTOs.

use serde::Deserialize;
use validator::Validate;

use super::validation::{no_control_chars, not_empty_trimmed};
use crate::category::{CategoryUpdate, NewCategory};
use crate::identity::{ProfileChanges, Registration};
use crate::news::{NewNewsItem, NewsUpdate};
use crate::speech::AudioRequest;

// ============================================================================
// Auth
// ============================================================================

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Token refresh or logout request. The token may come from a cookie instead.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Account registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: String,
    #[serde(rename = "fullName")]
    #[validate(
        custom(function = "not_empty_trimmed"),
        custom(function = "no_control_chars")
    )]
    pub full_name: String,
    #[serde(default)]
    pub notion_link: Option<String>,
    #[serde(default)]
    pub user_interests: Option<Vec<String>>,
    #[serde(default)]
    pub personal_categories: Option<Vec<String>>,
}

impl From<RegisterRequest> for Registration {
    fn from(req: RegisterRequest) -> Self {
        Self {
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            notion_link: req.notion_link,
            user_interests: req.user_interests.unwrap_or_default(),
            personal_categories: req.personal_categories.unwrap_or_default(),
        }
    }
}

/// Profile update request.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[serde(default, rename = "fullName")]
    #[validate(custom(function = "no_control_chars"))]
    pub full_name: Option<String>,
    #[serde(default)]
    pub notion_link: Option<String>,
    #[serde(default)]
    pub user_interests: Option<Vec<String>>,
}

impl From<UpdateProfileRequest> for ProfileChanges {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            full_name: req.full_name,
            notion_link: req.notion_link,
            user_interests: req.user_interests,
        }
    }
}

/// Personal categories replacement. Checked by hand so that a missing
/// field, a non-list and non-string members get distinct messages.
#[derive(Debug, Deserialize, Validate)]
pub struct PersonalCategoriesRequest {
    #[serde(default)]
    pub personal_categories: Option<serde_json::Value>,
}

impl PersonalCategoriesRequest {
    /// The requested list of category names.
    pub fn into_list(self) -> Result<Vec<String>, &'static str> {
        let value = self
            .personal_categories
            .ok_or("personal_categories is required")?;
        let items = value
            .as_array()
            .ok_or("personal_categories must be a list")?;
        items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or("personal_categories must contain only strings")
    }
}

// ============================================================================
// Categories
// ============================================================================

/// Category creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[serde(default)]
    #[validate(
        length(max = 100, message = "Name must be at most 100 characters"),
        custom(function = "not_empty_trimmed"),
        custom(function = "no_control_chars")
    )]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<CreateCategoryRequest> for NewCategory {
    fn from(req: CreateCategoryRequest) -> Self {
        let category = NewCategory::new(&req.name);
        match req.description {
            Some(description) => category.with_description(description),
            None => category,
        }
    }
}

/// Category update request.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[serde(default)]
    #[validate(
        length(max = 100, message = "Name must be at most 100 characters"),
        custom(function = "not_empty_trimmed"),
        custom(function = "no_control_chars")
    )]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<UpdateCategoryRequest> for CategoryUpdate {
    fn from(req: UpdateCategoryRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

/// Category query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub id: Option<String>,
    pub ids: Option<String>,
    pub name: Option<String>,
    pub names: Option<String>,
    pub limit: Option<usize>,
    pub last_evaluated_key: Option<String>,
}

/// News-by-categories query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct NewsByCategoriesQuery {
    pub category_ids: Option<String>,
    pub category_names: Option<String>,
    pub limit: Option<usize>,
}

// ============================================================================
// News
// ============================================================================

/// News item creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateNewsRequest {
    #[serde(default)]
    #[validate(custom(function = "not_empty_trimmed"))]
    pub title: String,
    #[serde(default)]
    #[validate(custom(function = "not_empty_trimmed"))]
    pub summary: String,
    #[serde(default)]
    #[validate(custom(function = "not_empty_trimmed"))]
    pub category_id: String,
    #[serde(default)]
    #[validate(custom(function = "not_empty_trimmed"))]
    pub picture_url: String,
    #[serde(default)]
    pub news_link: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub full_article: Option<String>,
}

impl From<CreateNewsRequest> for NewNewsItem {
    fn from(req: CreateNewsRequest) -> Self {
        let mut item = NewNewsItem::new(req.title, req.summary, req.category_id)
            .with_picture_url(req.picture_url)
            .with_news_link(req.news_link.unwrap_or_default())
            .with_author(req.author.unwrap_or_default())
            .with_full_article(req.full_article.unwrap_or_default());
        item.published_at = req.published_at;
        item
    }
}

/// News item partial update request.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateNewsRequest {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub category_id: Option<String>,
    pub picture_url: Option<String>,
    pub news_link: Option<String>,
    pub published_at: Option<String>,
    pub author: Option<String>,
    pub full_article: Option<String>,
}

impl From<UpdateNewsRequest> for NewsUpdate {
    fn from(req: UpdateNewsRequest) -> Self {
        Self {
            title: req.title,
            summary: req.summary,
            category_id: req.category_id,
            picture_url: req.picture_url,
            news_link: req.news_link,
            published_at: req.published_at,
            author: req.author,
            full_article: req.full_article,
        }
    }
}

/// News query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    pub id: Option<String>,
    pub category_id: Option<String>,
    pub last_evaluated_key: Option<String>,
}

// ============================================================================
// Bookmarks and audio
// ============================================================================

/// Bookmark creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct BookmarkRequest {
    #[serde(default)]
    #[validate(custom(function = "not_empty_trimmed"))]
    pub news_id: String,
}

/// Audio digest request.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateAudioRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 20,
        message = "news_ids must contain 1 to 20 ids"
    ))]
    pub news_ids: Vec<String>,
    #[serde(default)]
    pub voice_id: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub separator_text: Option<String>,
}

impl From<GenerateAudioRequest> for AudioRequest {
    fn from(req: GenerateAudioRequest) -> Self {
        Self {
            news_ids: req.news_ids,
            voice_id: req.voice_id,
            engine: req.engine,
            separator_text: req.separator_text,
        }
    }
}
