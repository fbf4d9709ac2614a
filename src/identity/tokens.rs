//! JWT access and ID tokens.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::user::User;
use crate::{Result, SkratimeError};

/// `token_use` claim of access tokens.
pub const TOKEN_USE_ACCESS: &str = "access";

/// `token_use` claim of ID tokens.
pub const TOKEN_USE_ID: &str = "id";

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID).
    pub sub: String,
    pub email: String,
    pub iat: u64,
    pub exp: u64,
    /// JWT ID.
    pub jti: String,
    pub token_use: String,
}

/// Claims carried by an ID token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdClaims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub email_verified: bool,
    pub notion_link: String,
    pub user_interests: Vec<String>,
    pub personal_categories: Vec<String>,
    pub iat: u64,
    pub exp: u64,
    pub token_use: String,
}

/// Signs and verifies HS256 tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_expiry_secs: u64,
}

impl TokenIssuer {
    /// Create an issuer from a shared secret.
    pub fn new(secret: &str, access_expiry_secs: u64) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_expiry_secs,
        }
    }

    /// Lifetime of access and ID tokens in seconds.
    pub fn access_expiry_secs(&self) -> u64 {
        self.access_expiry_secs
    }

    /// Issue an access token for a user.
    pub fn issue_access(&self, user: &User) -> Result<String> {
        let (iat, exp) = self.window();
        let claims = AccessClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            iat,
            exp,
            jti: uuid::Uuid::new_v4().to_string(),
            token_use: TOKEN_USE_ACCESS.to_string(),
        };
        self.sign(&claims)
    }

    /// Issue an ID token carrying the user's profile attributes.
    pub fn issue_id(&self, user: &User) -> Result<String> {
        let (iat, exp) = self.window();
        let claims = IdClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            name: user.full_name.clone(),
            email_verified: user.email_verified,
            notion_link: user.notion_link.clone(),
            user_interests: user.user_interests.clone(),
            personal_categories: user.personal_categories.clone(),
            iat,
            exp,
            token_use: TOKEN_USE_ID.to_string(),
        };
        self.sign(&claims)
    }

    /// Verify an access token.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims> {
        let claims: AccessClaims = self.verify(token)?;
        if claims.token_use != TOKEN_USE_ACCESS {
            return Err(SkratimeError::Auth("not an access token".into()));
        }
        Ok(claims)
    }

    /// Verify an ID token.
    pub fn verify_id(&self, token: &str) -> Result<IdClaims> {
        let claims: IdClaims = self.verify(token)?;
        if claims.token_use != TOKEN_USE_ID {
            return Err(SkratimeError::Auth("not an ID token".into()));
        }
        Ok(claims)
    }

    fn window(&self) -> (u64, u64) {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        (now, now + self.access_expiry_secs)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String> {
        encode(&Header::default(), claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            SkratimeError::Auth("failed to generate token".into())
        })
    }

    fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T> {
        decode::<T>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT validation failed: {}", e);
                SkratimeError::Auth("Invalid or expired token".into())
            })
    }
}
