//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;
use crate::config::CorsOrigins;

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let allow_origin = match origins {
        CorsOrigins::Any => AllowOrigin::from(Any),
        CorsOrigins::List(list) => AllowOrigin::list(
            list.iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        ),
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let body_limit = state.config.max_body_bytes;

    // Build the API router with versioned endpoints
    let api_v1 = Router::new()
        // Auth
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/user", get(handlers::current_user))
        // Posts
        .route("/posts", get(handlers::list_posts).post(handlers::create_post))
        .route(
            "/posts/{id}",
            get(handlers::show_post)
                .put(handlers::update_post)
                .patch(handlers::update_post)
                .delete(handlers::delete_post),
        )
        // Boxes
        .route("/boxes", get(handlers::list_boxes).post(handlers::create_box))
        .route(
            "/boxes/{id}",
            get(handlers::show_box)
                .put(handlers::update_box)
                .patch(handlers::update_box)
                .delete(handlers::delete_box),
        )
        // Items
        .route("/items", get(handlers::list_items).post(handlers::create_item))
        .route(
            "/items/{id}",
            get(handlers::show_item)
                .put(handlers::update_item)
                .patch(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route("/items/{id}/level", post(handlers::record_review));

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ServerConfig;
    use crate::db::repositories::LocalRepository;

    #[test]
    fn test_router_creation() {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn crate::db::repository::FullRepository>;
        let state = AppState::new(repo);
        let _router = create_router(state);
    }

    #[test]
    fn test_router_with_origin_list() {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn crate::db::repository::FullRepository>;
        let config = ServerConfig {
            cors_origins: CorsOrigins::List(vec!["https://app.example".to_string()]),
            ..ServerConfig::default()
        };
        let _router = create_router(AppState::with_config(repo, config));
    }
}
