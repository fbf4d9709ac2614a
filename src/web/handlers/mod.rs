//! API handlers.

pub mod audio;
pub mod auth;
pub mod bookmarks;
pub mod categories;
pub mod media;
pub mod news;
pub mod users;

pub use audio::*;
pub use auth::*;
pub use bookmarks::*;
pub use categories::*;
pub use media::*;
pub use news::*;
pub use users::*;

use std::sync::Arc;

use crate::config::{Config, SpeechConfig};
use crate::db::DbPool;
use crate::identity::{IdentityService, TokenIssuer};
use crate::speech::{ObjectStorage, SpeechSynthesizer};
use crate::Database;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: TokenIssuer,
    /// Refresh token lifetime in days.
    pub refresh_token_expiry_days: u64,
    pub storage: ObjectStorage,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub speech: SpeechConfig,
}

impl AppState {
    /// Create the state from configuration and its backing services.
    pub fn new(
        db: Database,
        config: &Config,
        storage: ObjectStorage,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            db,
            tokens: TokenIssuer::new(
                &config.web.jwt_secret,
                config.web.jwt_access_token_expiry_secs,
            ),
            refresh_token_expiry_days: config.web.jwt_refresh_token_expiry_days,
            storage,
            synthesizer,
            speech: config.speech.clone(),
        }
    }

    pub fn pool(&self) -> &DbPool {
        self.db.pool()
    }

    /// Identity operations bound to this state.
    pub fn identity(&self) -> IdentityService<'_> {
        IdentityService::new(self.db.pool(), &self.tokens, self.refresh_token_expiry_days)
    }
}

/// Split a comma-separated query value, dropping blanks.
pub(crate) fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
