// src/handlers/like.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        comment::{TargetKind, TargetRef},
        like::{LikeState, LikedUsersParams},
        user::Viewer,
    },
    services::Engagement,
};

fn target(kind: &str, id: i64) -> Result<TargetRef, AppError> {
    Ok(TargetRef {
        kind: kind.parse::<TargetKind>()?,
        id,
    })
}

/// Toggle Like on a post or comment.
/// Requires: Login.
pub async fn toggle_like(
    State(engine): State<Engagement>,
    Extension(viewer): Extension<Viewer>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let target = target(&kind, id)?;

    let liked = engine.likes.toggle(viewer, target).await?;

    Ok(Json(LikeState { liked }))
}

/// Whether the caller has liked the target.
pub async fn like_status(
    State(engine): State<Engagement>,
    Extension(viewer): Extension<Viewer>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let target = target(&kind, id)?;

    let liked = engine.likes.is_liked(viewer, target).await?;

    Ok(Json(LikeState { liked }))
}

/// Users who liked the target.
pub async fn liked_users(
    State(engine): State<Engagement>,
    Path((kind, id)): Path<(String, i64)>,
    Query(params): Query<LikedUsersParams>,
) -> Result<impl IntoResponse, AppError> {
    let target = target(&kind, id)?;

    let users = engine.likes.liked_users(target, params.limit).await?;

    Ok(Json(users))
}
