//! Category handlers.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::{split_list, AppState};
use crate::category::{
    CategoryRepository, CategoryUpdate, NewCategory, CATEGORY_PAGE_SIZE, MAX_CATEGORY_PAGE_SIZE,
};
use crate::db::decode_page_token;
use crate::news::NewsRepository;
use crate::web::dto::{
    CategoryDeletedResponse, CategoryMutationResponse, CategoryNews, CategoryQuery,
    CategoryResponse, CreateCategoryRequest, ItemsResponse, NewsByCategoriesQuery,
    NewsByCategoriesResponse, PageResponse, UpdateCategoryRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// Default number of news items per category.
const NEWS_PER_CATEGORY: usize = 10;

/// Upper bound for news items per category.
const MAX_NEWS_PER_CATEGORY: usize = 50;

/// POST /api/categories - Create a category.
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryMutationResponse>), ApiError> {
    let category = CategoryRepository::new(state.pool())
        .create(&NewCategory::from(req))
        .await?;

    tracing::info!(category_id = %category.id, name = %category.name, "Category created");
    Ok((
        StatusCode::CREATED,
        Json(CategoryMutationResponse {
            message: "Category created successfully".to_string(),
            category: category.into(),
        }),
    ))
}

/// GET /api/categories - Lookup by id, ids, name or names, or a paginated scan.
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(query): Query<CategoryQuery>,
) -> Result<Response, ApiError> {
    let repo = CategoryRepository::new(state.pool());

    if let Some(id) = query.id.as_deref().filter(|v| !v.is_empty()) {
        let category = repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Category not found"))?;
        return Ok(Json(CategoryResponse::from(category)).into_response());
    }

    if query.ids.is_some() {
        let items = repo.list_by_ids(&split_list(query.ids.as_deref())).await?;
        return Ok(Json(ItemsResponse::new(
            items.into_iter().map(CategoryResponse::from).collect(),
        ))
        .into_response());
    }

    if let Some(name) = query.name.as_deref().filter(|v| !v.trim().is_empty()) {
        let category = repo
            .get_by_name(name.trim())
            .await?
            .ok_or_else(|| ApiError::not_found("Category not found"))?;
        return Ok(Json(CategoryResponse::from(category)).into_response());
    }

    if query.names.is_some() {
        let items = repo
            .list_by_names(&split_list(query.names.as_deref()))
            .await?;
        return Ok(Json(ItemsResponse::new(
            items.into_iter().map(CategoryResponse::from).collect(),
        ))
        .into_response());
    }

    let after = query
        .last_evaluated_key
        .as_deref()
        .map(decode_page_token)
        .transpose()?;
    let limit = query
        .limit
        .unwrap_or(CATEGORY_PAGE_SIZE)
        .clamp(1, MAX_CATEGORY_PAGE_SIZE);

    let page = repo
        .list_page(limit, after.as_ref())
        .await?
        .map(CategoryResponse::from);
    Ok(Json(PageResponse::from(page)).into_response())
}

/// GET /api/categories/:id - Get a category.
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let category = CategoryRepository::new(state.pool())
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;
    Ok(Json(category.into()))
}

/// PUT /api/categories/:id - Rename or describe a category.
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateCategoryRequest>,
) -> Result<Json<CategoryMutationResponse>, ApiError> {
    let update = CategoryUpdate::from(req);
    if update.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let category = CategoryRepository::new(state.pool())
        .update(&id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    Ok(Json(CategoryMutationResponse {
        message: "Category updated successfully".to_string(),
        category: category.into(),
    }))
}

/// DELETE /api/categories/:id - Delete a category.
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CategoryDeletedResponse>, ApiError> {
    if !CategoryRepository::new(state.pool()).delete(&id).await? {
        return Err(ApiError::not_found("Category not found"));
    }

    tracing::info!(category_id = %id, "Category deleted");
    Ok(Json(CategoryDeletedResponse {
        message: "Category deleted successfully".to_string(),
        id,
    }))
}

/// GET /api/news-by-categories - Latest news grouped by category.
pub async fn news_by_categories(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(query): Query<NewsByCategoriesQuery>,
) -> Result<Json<NewsByCategoriesResponse>, ApiError> {
    let mut ids = split_list(query.category_ids.as_deref());
    let names = split_list(query.category_names.as_deref());
    if ids.is_empty() && names.is_empty() {
        return Err(ApiError::bad_request(
            "At least one of category_ids or category_names is required",
        ));
    }

    let categories = CategoryRepository::new(state.pool());
    if !names.is_empty() {
        ids.extend(categories.list_by_names(&names).await?.into_iter().map(|c| c.id));
    }
    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));

    let limit = query
        .limit
        .unwrap_or(NEWS_PER_CATEGORY)
        .clamp(1, MAX_NEWS_PER_CATEGORY);

    let mut known: HashMap<String, CategoryResponse> = categories
        .list_by_ids(&ids)
        .await?
        .into_iter()
        .map(|c| (c.id.clone(), c.into()))
        .collect();

    let news = NewsRepository::new(state.pool());
    let mut grouped = BTreeMap::new();
    let mut total_news_count = 0;
    for id in &ids {
        let Some(category) = known.remove(id) else {
            tracing::debug!(category_id = %id, "Skipping unknown category");
            continue;
        };
        let items = news.latest_in_category(id, limit).await?;
        total_news_count += items.len();
        grouped.insert(
            id.clone(),
            CategoryNews {
                category,
                count: items.len(),
                news: items,
            },
        );
    }

    Ok(Json(NewsByCategoriesResponse {
        categories: grouped,
        total_news_count,
    }))
}
