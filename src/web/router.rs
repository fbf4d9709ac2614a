//! Router configuration.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    add_bookmark, create_category, create_news, delete_category, delete_news, generate_audio,
    get_category, get_media, get_news, get_profile, list_bookmarks, list_categories, list_news,
    login, logout, news_by_categories, refresh, register, remove_bookmark, update_category,
    update_news, update_personal_categories, update_profile, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth};

/// Create the application router: `/api`, `/media` and `/health`.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout));

    let user_routes = Router::new()
        .route("/me", get(get_profile).put(update_profile))
        .route(
            "/me/personal-categories",
            put(update_personal_categories).patch(update_personal_categories),
        );

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/users", user_routes)
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/news-by-categories", get(news_by_categories))
        .route("/news", get(list_news).post(create_news))
        .route(
            "/news/:id",
            get(get_news).put(update_news).delete(delete_news),
        )
        .route("/bookmarks", get(list_bookmarks).post(add_bookmark))
        .route("/bookmarks/:news_id", axum::routing::delete(remove_bookmark))
        .route("/audio", post(generate_audio));

    let issuer = Arc::new(app_state.tokens.clone());

    Router::new()
        .nest("/api", api_routes)
        .route("/media/*key", get(get_media))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    jwt_auth(issuer.clone(), req, next)
                })),
        )
        .with_state(app_state)
        .merge(create_health_router())
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

async fn health_check() -> &'static str {
    "OK"
}
