//! Signed media downloads.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::AppState;
use crate::web::error::ApiError;

/// Signature parameters of a media URL.
#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    pub expires: Option<i64>,
    pub signature: Option<String>,
}

/// GET /media/*key - Serve a stored object to holders of a valid signed URL.
pub async fn get_media(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<MediaQuery>,
) -> Result<Response, ApiError> {
    let (Some(expires), Some(signature)) = (query.expires, query.signature) else {
        return Err(ApiError::forbidden("Missing signature"));
    };

    state
        .storage
        .verify(&key, expires, &signature, chrono::Utc::now())?;

    let object = state.storage.get(&key).await?;
    Ok(([(CONTENT_TYPE, object.content_type)], object.bytes).into_response())
}
