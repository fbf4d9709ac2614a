//! Audio digest handler.

use std::sync::Arc;

use axum::{extract::State, Json};

use super::AppState;
use crate::speech::{AudioRequest, AudioResult, AudioService};
use crate::web::dto::{GenerateAudioRequest, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// POST /api/audio - Synthesize news items into one MP3 and return a signed link.
pub async fn generate_audio(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<GenerateAudioRequest>,
) -> Result<Json<AudioResult>, ApiError> {
    let request = AudioRequest::from(req);
    tracing::info!(
        user_id = %auth.user_id(),
        items = request.news_ids.len(),
        "Audio requested"
    );

    let result = AudioService::new(
        state.pool(),
        &state.storage,
        state.synthesizer.clone(),
        &state.speech,
    )
    .generate(&request)
    .await?;

    Ok(Json(result))
}
