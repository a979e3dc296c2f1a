// src/routes.rs

use axum::{
    Router,
    http::{Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{comment, like, post},
    state::AppState,
    utils::jwt::identity_middleware,
};

/// Assembles the main application router.
///
/// * Merges the comment, like and post sub-routers.
/// * Resolves the caller's identity for every API route.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let post_routes = Router::new()
        .route(
            "/{id}/comments",
            get(comment::list_comments).post(comment::create_comment),
        )
        .route("/{id}/views", post(post::record_view))
        .route("/{id}/stats", get(post::post_stats));

    let comment_routes = Router::new().route(
        "/{id}",
        get(comment::get_comment)
            .put(comment::update_comment)
            .delete(comment::delete_comment),
    );

    let like_routes = Router::new()
        .route(
            "/{kind}/{id}",
            get(like::like_status).post(like::toggle_like),
        )
        .route("/{kind}/{id}/users", get(like::liked_users));

    let api_routes = Router::new()
        .nest("/posts", post_routes)
        .nest("/comments", comment_routes)
        .nest("/likes", like_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ));

    Router::new()
        .route("/health", get(post::health))
        .nest("/api", api_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
