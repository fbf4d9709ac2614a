//! Profile handlers for the signed-in user.

use axum::{extract::State, Json};
use std::sync::Arc;

use super::AppState;
use crate::identity::{ProfileChanges, UserProfile};
use crate::web::dto::{
    PersonalCategoriesRequest, PersonalCategoriesResponse, UpdateProfileRequest, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// GET /api/users/me - Current profile.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state.identity().profile(auth.user_id()).await?;
    Ok(Json(profile))
}

/// PUT /api/users/me - Update name, notion link or interests.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state
        .identity()
        .update_profile(auth.user_id(), &ProfileChanges::from(req))
        .await?;
    Ok(Json(profile))
}

/// PUT|PATCH /api/users/me/personal-categories - Replace the personal category list.
pub async fn update_personal_categories(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<PersonalCategoriesRequest>,
) -> Result<Json<PersonalCategoriesResponse>, ApiError> {
    let categories = req.into_list().map_err(ApiError::bad_request)?;

    let personal_categories = state
        .identity()
        .update_personal_categories(auth.user_id(), &categories)
        .await?;

    tracing::info!(
        user_id = %auth.user_id(),
        count = personal_categories.len(),
        "Personal categories updated"
    );
    Ok(Json(PersonalCategoriesResponse {
        message: "Personal categories updated successfully".to_string(),
        personal_categories,
    }))
}
