//! HTTP middleware.

pub mod auth;
pub mod cors;

pub use auth::{jwt_auth, AuthUser, ACCESS_TOKEN_COOKIE};
pub use cors::create_cors_layer;
