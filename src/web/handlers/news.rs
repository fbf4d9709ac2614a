//! News item handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::AppState;
use crate::db::decode_page_token;
use crate::news::{NewNewsItem, NewsItem, NewsRepository, NewsUpdate, NEWS_PAGE_SIZE};
use crate::web::dto::{
    CreateNewsRequest, MessageResponse, NewsCreatedResponse, NewsQuery, PageResponse,
    UpdateNewsRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

async fn find(state: &AppState, id: &str) -> Result<NewsItem, ApiError> {
    NewsRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item not found"))
}

/// POST /api/news - Create a news item.
pub async fn create_news(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateNewsRequest>,
) -> Result<(StatusCode, Json<NewsCreatedResponse>), ApiError> {
    let item = NewsRepository::new(state.pool())
        .create(&NewNewsItem::from(req))
        .await?;

    tracing::info!(news_id = %item.id, "News item created");
    Ok((
        StatusCode::CREATED,
        Json(NewsCreatedResponse {
            message: "Item created".to_string(),
            id: item.id,
        }),
    ))
}

/// GET /api/news - Single item, category listing or paginated scan.
pub async fn list_news(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(query): Query<NewsQuery>,
) -> Result<Response, ApiError> {
    if let Some(id) = query.id.as_deref().filter(|v| !v.is_empty()) {
        return Ok(Json(find(&state, id).await?).into_response());
    }

    let after = query
        .last_evaluated_key
        .as_deref()
        .map(decode_page_token)
        .transpose()?;
    let repo = NewsRepository::new(state.pool());

    let category_id = query.category_id.as_deref().filter(|v| !v.is_empty());
    // Tokens are bound to the listing that issued them.
    if after
        .as_ref()
        .is_some_and(|key| key.category_id.as_deref() != category_id)
    {
        return Err(ApiError::bad_request("Invalid pagination token"));
    }

    let page = match category_id {
        Some(category_id) => {
            repo.list_category_page(category_id, NEWS_PAGE_SIZE, after.as_ref())
                .await?
        }
        None => repo.list_page(NEWS_PAGE_SIZE, after.as_ref()).await?,
    };

    Ok(Json(PageResponse::from(page)).into_response())
}

/// GET /api/news/:id - Get a news item.
pub async fn get_news(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<NewsItem>, ApiError> {
    Ok(Json(find(&state, &id).await?))
}

/// PUT /api/news/:id - Partial update.
pub async fn update_news(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateNewsRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let update = NewsUpdate::from(req);
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    if !NewsRepository::new(state.pool()).update(&id, &update).await? {
        return Err(ApiError::not_found("Item not found"));
    }
    Ok(Json(MessageResponse::new("Item updated")))
}

/// DELETE /api/news/:id - Delete a news item.
pub async fn delete_news(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !NewsRepository::new(state.pool()).delete(&id).await? {
        return Err(ApiError::not_found("Item not found"));
    }

    tracing::info!(news_id = %id, "News item deleted");
    Ok(Json(MessageResponse::new("Item deleted")))
}
