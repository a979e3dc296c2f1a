// src/handlers/post.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{error::AppError, services::Engagement};

/// Count a view of a post.
pub async fn record_view(
    State(engine): State<Engagement>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let counters = engine.posts.record_view(post_id).await?;

    Ok(Json(counters))
}

/// Engagement counters of a post.
pub async fn post_stats(
    State(engine): State<Engagement>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let counters = engine.posts.counters(post_id).await?;

    Ok(Json(counters))
}

/// Liveness probe: checks the database answers.
pub async fn health(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(Json(serde_json::json!({ "status": "ok" })))
}
