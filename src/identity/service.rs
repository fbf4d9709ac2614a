//! Account operations: registration, sign-in, token refresh and profiles.

use serde::Serialize;

use super::attributes::{check_length, encode_list};
use super::password::{hash_password, validate_password, verify_password};
use super::tokens::{IdClaims, TokenIssuer};
use super::user::{NewUser, ProfileUpdate, User, UserRepository};
use crate::db::{DbPool, NewRefreshToken, RefreshTokenRepository};
use crate::{Result, SkratimeError};

/// Registration input.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub notion_link: Option<String>,
    pub user_interests: Vec<String>,
    pub personal_categories: Vec<String>,
}

/// Profile changes requested by a user.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub notion_link: Option<String>,
    pub user_interests: Option<Vec<String>>,
}

/// Tokens issued by a successful sign-in or refresh.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    /// Verified claims of `id_token`.
    pub id_claims: IdClaims,
}

/// Profile as returned to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
    pub email_verified: bool,
    pub notion_link: String,
    pub user_interests: Vec<String>,
    pub personal_categories: Vec<String>,
    pub username: String,
    pub user_status: String,
    pub enabled: bool,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.full_name,
            email_verified: user.email_verified,
            notion_link: user.notion_link,
            user_interests: user.user_interests,
            personal_categories: user.personal_categories,
            username: user.id,
            user_status: user.user_status,
            enabled: user.enabled,
        }
    }
}

/// Identity store operations.
pub struct IdentityService<'a> {
    pool: &'a DbPool,
    tokens: &'a TokenIssuer,
    refresh_ttl_days: u64,
}

impl<'a> IdentityService<'a> {
    /// Create a service over a pool and token issuer.
    pub fn new(pool: &'a DbPool, tokens: &'a TokenIssuer, refresh_ttl_days: u64) -> Self {
        Self {
            pool,
            tokens,
            refresh_ttl_days,
        }
    }

    /// Register a new account. Returns the new subject ID.
    pub async fn register(&self, registration: &Registration) -> Result<String> {
        validate_password(&registration.password)
            .map_err(|e| SkratimeError::Validation(e.to_string()))?;

        let notion_link = registration.notion_link.clone().unwrap_or_default();
        check_length("notion_link", &notion_link)?;
        let new_user = NewUser {
            email: registration.email.trim().to_string(),
            password_hash: hash_password(&registration.password).map_err(|e| {
                tracing::error!("Password hashing failed: {}", e);
                SkratimeError::Auth("failed to hash password".into())
            })?,
            full_name: registration.full_name.trim().to_string(),
            notion_link,
            user_interests: encode_list("user_interests", &registration.user_interests)?,
            personal_categories: encode_list(
                "personal_categories",
                &registration.personal_categories,
            )?,
        };

        let user = UserRepository::new(self.pool).create(&new_user).await?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.id)
    }

    /// Sign in with email and password.
    ///
    /// Unknown emails are `NotFound`, wrong passwords `Auth` and disabled
    /// accounts `Permission`.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, AuthSession)> {
        let users = UserRepository::new(self.pool);
        let user = users
            .get_by_email(email)
            .await?
            .ok_or_else(|| SkratimeError::NotFound("User".into()))?;

        verify_password(password, &user.password)
            .map_err(|_| SkratimeError::Auth("Incorrect username or password".into()))?;

        if !user.enabled {
            return Err(SkratimeError::Permission("Account is disabled".into()));
        }

        let refresh = NewRefreshToken::issue(&user.id, self.refresh_ttl_days);
        RefreshTokenRepository::new(self.pool).create(&refresh).await?;

        if let Err(e) = users.touch_last_login(&user.id).await {
            tracing::warn!(user_id = %user.id, "Failed to record last login: {}", e);
        }

        let session = self.session(&user, refresh.token)?;
        Ok((user, session))
    }

    /// Exchange a refresh token for new tokens, rotating the refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(User, AuthSession)> {
        let invalid = || SkratimeError::Auth("Invalid or expired refresh token".into());
        let tokens = RefreshTokenRepository::new(self.pool);

        let stored = tokens.get_valid_token(refresh_token).await?.ok_or_else(invalid)?;
        let user = UserRepository::new(self.pool)
            .get_by_id(&stored.user_id)
            .await?
            .ok_or_else(invalid)?;

        if !user.enabled {
            return Err(SkratimeError::Permission("Account is disabled".into()));
        }

        let replacement = NewRefreshToken::issue(&user.id, self.refresh_ttl_days);
        if !tokens.rotate(refresh_token, &replacement).await? {
            return Err(invalid());
        }

        let session = self.session(&user, replacement.token)?;
        Ok((user, session))
    }

    /// Revoke a refresh token. Unknown tokens are ignored.
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        let revoked = RefreshTokenRepository::new(self.pool)
            .revoke(refresh_token)
            .await?;
        tracing::debug!(revoked, "Logout");
        Ok(())
    }

    /// Current profile of a user.
    pub async fn profile(&self, user_id: &str) -> Result<UserProfile> {
        UserRepository::new(self.pool)
            .get_by_id(user_id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| SkratimeError::NotFound("User".into()))
    }

    /// Update profile attributes.
    pub async fn update_profile(
        &self,
        user_id: &str,
        changes: &ProfileChanges,
    ) -> Result<UserProfile> {
        if let Some(link) = &changes.notion_link {
            check_length("notion_link", link)?;
        }
        let update = ProfileUpdate {
            full_name: changes.full_name.as_ref().map(|n| n.trim().to_string()),
            notion_link: changes.notion_link.clone(),
            user_interests: changes
                .user_interests
                .as_deref()
                .map(|values| encode_list("user_interests", values))
                .transpose()?,
            personal_categories: None,
        };

        UserRepository::new(self.pool)
            .update_profile(user_id, &update)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| SkratimeError::NotFound("User".into()))
    }

    /// Replace a user's personal category list.
    pub async fn update_personal_categories(
        &self,
        user_id: &str,
        categories: &[String],
    ) -> Result<Vec<String>> {
        let update = ProfileUpdate {
            personal_categories: Some(encode_list("personal_categories", categories)?),
            ..Default::default()
        };

        let user = UserRepository::new(self.pool)
            .update_profile(user_id, &update)
            .await?
            .ok_or_else(|| SkratimeError::NotFound("User".into()))?;
        Ok(user.personal_categories)
    }

    fn session(&self, user: &User, refresh_token: String) -> Result<AuthSession> {
        let access_token = self.tokens.issue_access(user)?;
        let id_token = self.tokens.issue_id(user)?;
        let id_claims = self.tokens.verify_id(&id_token)?;

        Ok(AuthSession {
            access_token,
            id_token,
            refresh_token,
            expires_in: self.tokens.access_expiry_secs(),
            id_claims,
        })
    }
}
