//! Authentication handlers.

use axum::{
    body::Bytes,
    extract::State,
    http::{header::ORIGIN, HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use time::Duration;

use super::AppState;
use crate::identity::{AuthSession, Registration};
use crate::web::dto::{
    LoginRequest, LoginResponse, MessageResponse, RefreshRequest, RegisterRequest,
    RegisterResponse, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::{AuthUser, ACCESS_TOKEN_COOKIE};
use crate::SkratimeError;

pub const ID_TOKEN_COOKIE: &str = "idToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Lifetime of the refresh token cookie (30 days).
pub const REFRESH_COOKIE_MAX_AGE: i64 = 2_592_000;

/// Cross-site https front ends need `Secure; SameSite=None`.
fn is_https_origin(headers: &HeaderMap) -> bool {
    headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|origin| origin.starts_with("https://"))
}

fn auth_cookie(name: &'static str, value: String, https: bool, max_age: i64) -> Cookie<'static> {
    let same_site = if https { SameSite::None } else { SameSite::Lax };
    Cookie::build((name, value))
        .http_only(true)
        .secure(https)
        .same_site(same_site)
        .path("/")
        .max_age(Duration::seconds(max_age))
        .build()
}

fn session_cookies(request_headers: &HeaderMap, session: &AuthSession) -> CookieJar {
    let https = is_https_origin(request_headers);
    let access_max_age = i64::try_from(session.expires_in).unwrap_or(i64::MAX);
    CookieJar::new()
        .add(auth_cookie(ACCESS_TOKEN_COOKIE, session.access_token.clone(), https, access_max_age))
        .add(auth_cookie(ID_TOKEN_COOKIE, session.id_token.clone(), https, access_max_age))
        .add(auth_cookie(
            REFRESH_TOKEN_COOKIE,
            session.refresh_token.clone(),
            https,
            REFRESH_COOKIE_MAX_AGE,
        ))
}

fn cleared_cookies(request_headers: &HeaderMap) -> CookieJar {
    let https = is_https_origin(request_headers);
    [ACCESS_TOKEN_COOKIE, ID_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE]
        .into_iter()
        .fold(CookieJar::new(), |jar, name| {
            jar.add(auth_cookie(name, String::new(), https, 0))
        })
}

/// Refresh token from the JSON body, falling back to the cookie.
fn refresh_token_from(body: &Bytes, jar: &CookieJar) -> Result<Option<String>, ApiError> {
    let request: RefreshRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RefreshRequest::default()
    } else {
        serde_json::from_slice(body)
            .map_err(|e| ApiError::bad_request(format!("Invalid request body: {e}")))?
    };

    Ok(request
        .refresh_token
        .filter(|t| !t.is_empty())
        .or_else(|| jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string()))
        .filter(|t| !t.is_empty()))
}

/// POST /api/auth/register - Create an account.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let user_sub = state.identity().register(&Registration::from(req)).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user_sub,
        }),
    ))
}

/// POST /api/auth/login - Sign in and set the session cookies.
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let (user, session) = state
        .identity()
        .login(req.email.trim(), &req.password)
        .await
        .map_err(|e| match e {
            SkratimeError::NotFound(_) => ApiError::not_found("User does not exist"),
            SkratimeError::Auth(_) => ApiError::unauthorized("Incorrect username or password"),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, "User logged in");
    let cookies = session_cookies(&headers, &session);
    Ok((cookies, Json(LoginResponse::new("Login successful", session))))
}

/// POST /api/auth/refresh - Rotate the refresh token and issue new tokens.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let token = refresh_token_from(&body, &jar)?
        .ok_or_else(|| ApiError::unauthorized("Missing refresh token"))?;

    let (_, session) = state.identity().refresh(&token).await?;
    let cookies = session_cookies(&headers, &session);
    Ok((cookies, Json(LoginResponse::new("Token refreshed", session))))
}

/// POST /api/auth/logout - Revoke the refresh token and clear cookies.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    headers: HeaderMap,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    if let Some(token) = refresh_token_from(&body, &jar)? {
        state.identity().logout(&token).await?;
    }

    tracing::info!(user_id = %auth.user_id(), "User logged out");
    Ok((
        cleared_cookies(&headers),
        Json(MessageResponse::new("Logged out successfully")),
    ))
}
