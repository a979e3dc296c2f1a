// src/handlers/comment.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        comment::{
            ClientMeta, CommentListParams, CommentQuery, CreateCommentRequest, TargetRef,
            UpdateCommentRequest,
        },
        user::Viewer,
    },
    services::{
        Engagement,
        comments::{CommentEdit, NewComment},
    },
};

/// Create a new comment on a post.
/// Requires: Login.
pub async fn create_comment(
    State(engine): State<Engagement>,
    Extension(viewer): Extension<Viewer>,
    Path(post_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let author = viewer.require()?;
    payload.validate()?;

    let id = engine
        .comments
        .create(
            author,
            NewComment {
                target: TargetRef::post(post_id),
                reply_id: payload.reply_id,
                content: payload.content,
                is_private: payload.is_private,
                show_client_info: payload.show_client_info,
                client: client_meta(&headers),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// List the comments of a post visible to the caller.
pub async fn list_comments(
    State(engine): State<Engagement>,
    Extension(viewer): Extension<Viewer>,
    Path(post_id): Path<i64>,
    Query(params): Query<CommentListParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = CommentQuery::from_params(
        TargetRef::post(post_id),
        &params,
        engine.settings.page_size_max,
    )?;

    let page = engine.visibility.list(viewer, &query).await?;

    Ok(Json(page))
}

/// Get a single comment by ID.
pub async fn get_comment(
    State(engine): State<Engagement>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let comment = engine.visibility.get(viewer, id).await?;

    Ok(Json(comment))
}

/// Edit a comment.
/// Requires: Login + Author.
pub async fn update_comment(
    State(engine): State<Engagement>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let author = viewer.require()?;
    payload.validate()?;

    engine
        .comments
        .update(
            author,
            id,
            CommentEdit {
                content: payload.content,
                is_private: payload.is_private,
                show_client_info: payload.show_client_info,
            },
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a comment together with all of its replies.
/// Requires: Login + Author.
pub async fn delete_comment(
    State(engine): State<Engagement>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let author = viewer.require()?;

    engine.comments.delete(author, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Client address and agent as reported by the fronting proxy.
fn client_meta(headers: &HeaderMap) -> ClientMeta {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    };

    let forwarded = header_str("x-forwarded-for");
    let remote_addr = match forwarded.split(',').next().map(str::trim) {
        Some(first) if !first.is_empty() => first.to_string(),
        _ => header_str("x-real-ip"),
    };

    ClientMeta {
        remote_addr,
        user_agent: header_str(header::USER_AGENT.as_str()),
    }
}
