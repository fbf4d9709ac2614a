//! Bookmark handlers. The owner is always the authenticated subject.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::AppState;
use crate::bookmark::BookmarkRepository;
use crate::web::dto::{
    BookmarkRequest, BookmarkResponse, BookmarksResponse, MessageResponse, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// POST /api/bookmarks - Bookmark a news item. Repeating the call is harmless.
pub async fn add_bookmark(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<BookmarkRequest>,
) -> Result<(StatusCode, Json<BookmarkResponse>), ApiError> {
    let news_id = req.news_id.trim().to_string();
    let created = BookmarkRepository::new(state.pool())
        .add(auth.user_id(), &news_id)
        .await?;

    let (status, message) = if created {
        (StatusCode::CREATED, "Bookmark added")
    } else {
        (StatusCode::OK, "Bookmark already exists")
    };
    Ok((
        status,
        Json(BookmarkResponse {
            message: message.to_string(),
            user_id: auth.user_id().to_string(),
            news_id,
        }),
    ))
}

/// DELETE /api/bookmarks/:news_id - Remove a bookmark.
pub async fn remove_bookmark(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(news_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !BookmarkRepository::new(state.pool())
        .remove(auth.user_id(), &news_id)
        .await?
    {
        return Err(ApiError::not_found("Bookmark not found"));
    }
    Ok(Json(MessageResponse::new("Bookmark removed")))
}

/// GET /api/bookmarks - Bookmarked news, newest bookmark first.
pub async fn list_bookmarks(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BookmarksResponse>, ApiError> {
    let bookmarks = BookmarkRepository::new(state.pool())
        .list_for_user(auth.user_id())
        .await?;
    Ok(Json(BookmarksResponse {
        count: bookmarks.len(),
        bookmarks,
    }))
}
