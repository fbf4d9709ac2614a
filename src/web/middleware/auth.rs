//! Bearer token authentication.

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::identity::{AccessClaims, TokenIssuer};
use crate::web::error::ApiError;

/// Cookie carrying the access token for browser clients.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Extractor for authenticated users.
///
/// The access token is read from the `Authorization: Bearer` header, then
/// from the `accessToken` cookie.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AccessClaims);

impl AuthUser {
    /// Subject (user ID).
    pub fn user_id(&self) -> &str {
        &self.0.sub
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .or_else(|| cookie_token(&parts.headers))
            .ok_or_else(|| ApiError::unauthorized("Missing authorization"))?;

        let issuer = parts
            .extensions
            .get::<Arc<TokenIssuer>>()
            .ok_or_else(|| ApiError::internal("Token issuer not configured"))?;

        let claims = issuer.verify_access(&token).map_err(|e| {
            tracing::debug!("Access token rejected: {}", e);
            ApiError::unauthorized("Invalid or expired token")
        })?;

        Ok(AuthUser(claims))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Middleware function to inject the token issuer into request extensions.
pub async fn jwt_auth(
    issuer: Arc<TokenIssuer>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(issuer);
    next.run(request).await
}
