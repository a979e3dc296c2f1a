// src/models/comment.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;

/// Kind of content entity a comment or like attaches to.
///
/// Stored as its lowercase tag in `target_type` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Post,
    Comment,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Post => "post",
            TargetKind::Comment => "comment",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(TargetKind::Post),
            "comment" => Ok(TargetKind::Comment),
            _ => Err(AppError::InvalidTarget),
        }
    }
}

/// A `(type, id)` reference to a commentable or likeable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetRef {
    pub kind: TargetKind,
    pub id: i64,
}

impl TargetRef {
    pub fn post(id: i64) -> Self {
        Self {
            kind: TargetKind::Post,
            id,
        }
    }

    pub fn comment(id: i64) -> Self {
        Self {
            kind: TargetKind::Comment,
            id,
        }
    }
}

/// Represents the 'comments' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: i64,
    pub user_id: i64,
    pub target_type: String,
    pub target_id: i64,
    /// Parent comment id, `0` for a root comment.
    pub reply_id: i64,
    /// Top-most ancestor; equals `id` for a root comment.
    pub root_id: i64,
    pub depth: i64,
    pub content: String,
    pub is_private: bool,
    pub show_client_info: bool,
    #[serde(skip)]
    pub remote_addr: String,
    pub location: String,
    #[serde(skip)]
    pub user_agent: String,
    pub client_info: String,
    pub like_count: i64,
    pub reply_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.reply_id == 0
    }
}

/// Where a write request came from. Supplied by the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub remote_addr: String,
    pub user_agent: String,
}

/// DTO for creating a new comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Comment must be between 1 and 1000 characters"
    ))]
    pub content: String,

    /// Optional: the ID of the comment being replied to.
    #[serde(default)]
    pub reply_id: Option<i64>,

    #[serde(default)]
    pub is_private: bool,

    #[serde(default = "default_true")]
    pub show_client_info: bool,
}

/// DTO for editing an existing comment. Structural fields cannot be changed.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Comment must be between 1 and 1000 characters"
    ))]
    pub content: String,

    pub is_private: bool,

    pub show_client_info: bool,
}

fn default_true() -> bool {
    true
}

/// Columns a comment listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentOrder {
    CreatedAt,
    LikeCount,
    ReplyCount,
    Id,
}

impl CommentOrder {
    pub fn column(&self) -> &'static str {
        match self {
            CommentOrder::CreatedAt => "c.created_at",
            CommentOrder::LikeCount => "c.like_count",
            CommentOrder::ReplyCount => "c.reply_count",
            CommentOrder::Id => "c.id",
        }
    }
}

impl FromStr for CommentOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(CommentOrder::CreatedAt),
            "like_count" => Ok(CommentOrder::LikeCount),
            "reply_count" => Ok(CommentOrder::ReplyCount),
            "id" => Ok(CommentOrder::Id),
            other => Err(AppError::BadRequest(format!("Unknown order key: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(AppError::BadRequest(format!("Unknown sort direction: {other}"))),
        }
    }
}

/// Query parameters for listing comments.
#[derive(Debug, Default, Deserialize)]
pub struct CommentListParams {
    /// Only direct children of this comment (threaded view).
    pub parent_id: Option<i64>,
    /// Only comments at this depth (flat view).
    pub depth: Option<i64>,
    /// 'created_at' (default), 'like_count', 'reply_count' or 'id'.
    pub order_by: Option<String>,
    /// 'asc' or 'desc' (default).
    pub order: Option<String>,
    /// 1-based page number.
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// A validated listing request.
#[derive(Debug, Clone, Copy)]
pub struct CommentQuery {
    pub target: TargetRef,
    pub parent_id: Option<i64>,
    pub depth: Option<i64>,
    pub order_by: CommentOrder,
    pub direction: SortDirection,
    pub page: i64,
    pub page_size: i64,
}

impl CommentQuery {
    /// Validates raw parameters, clamping the page size to `page_size_max`.
    pub fn from_params(
        target: TargetRef,
        params: &CommentListParams,
        page_size_max: i64,
    ) -> Result<Self, AppError> {
        let order_by = match params.order_by.as_deref() {
            Some(key) => key.parse()?,
            None => CommentOrder::CreatedAt,
        };
        let direction = match params.order.as_deref() {
            Some(dir) => dir.parse()?,
            None => SortDirection::Desc,
        };
        if let Some(depth) = params.depth {
            if depth < 0 {
                return Err(AppError::BadRequest("depth must not be negative".to_string()));
            }
        }

        let page = params.page.unwrap_or(1).max(1);
        let page_size = params.page_size.unwrap_or(20).clamp(1, page_size_max.max(1));
        // The offset must fit an i64.
        if (page - 1).checked_mul(page_size).is_none() {
            return Err(AppError::BadRequest("page is out of range".to_string()));
        }

        Ok(Self {
            target,
            parent_id: params.parent_id,
            depth: params.depth,
            order_by,
            direction,
            page,
            page_size,
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

/// DTO for displaying a comment to a particular viewer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommentView {
    pub id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub target_type: String,
    pub target_id: i64,
    pub reply_id: i64,
    pub root_id: i64,
    pub depth: i64,
    pub content: String,
    pub is_private: bool,
    pub show_client_info: bool,
    pub location: String,
    pub client_info: String,
    pub like_count: i64,
    pub reply_count: i64,
    /// Whether the viewer has liked this comment.
    pub liked: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl CommentView {
    /// Blanks client details the author chose not to show, unless the
    /// viewer is the author.
    pub fn redact_for(mut self, viewer_id: Option<i64>) -> Self {
        if !self.show_client_info && viewer_id != Some(self.user_id) {
            self.location.clear();
            self.client_info.clear();
        }
        self
    }
}

/// One page of a comment listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommentPage {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub items: Vec<CommentView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_kind_parses_known_tags_only() {
        assert_eq!("post".parse::<TargetKind>().unwrap(), TargetKind::Post);
        assert_eq!("comment".parse::<TargetKind>().unwrap(), TargetKind::Comment);
        assert!(matches!("page".parse::<TargetKind>(), Err(AppError::InvalidTarget)));
    }

    #[test]
    fn query_defaults_and_clamps() {
        let params = CommentListParams {
            page: Some(0),
            page_size: Some(500),
            ..Default::default()
        };
        let q = CommentQuery::from_params(TargetRef::post(1), &params, 100).unwrap();
        assert_eq!(q.order_by, CommentOrder::CreatedAt);
        assert_eq!(q.direction, SortDirection::Desc);
        assert_eq!(q.page, 1);
        assert_eq!(q.page_size, 100);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn query_rejects_page_beyond_any_offset() {
        let params = CommentListParams {
            page: Some(i64::MAX),
            page_size: Some(50),
            ..Default::default()
        };
        assert!(matches!(
            CommentQuery::from_params(TargetRef::post(1), &params, 100),
            Err(AppError::BadRequest(_))
        ));

        let params = CommentListParams {
            page: Some(1_000),
            page_size: Some(50),
            ..Default::default()
        };
        let q = CommentQuery::from_params(TargetRef::post(1), &params, 100).unwrap();
        assert_eq!(q.offset(), 999 * 50);
    }

    #[test]
    fn query_rejects_unknown_order_key() {
        let params = CommentListParams {
            order_by: Some("content; DROP TABLE comments".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            CommentQuery::from_params(TargetRef::post(1), &params, 100),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn hidden_client_info_is_visible_to_author_only() {
        let view = CommentView {
            id: 1,
            user_id: 7,
            username: None,
            target_type: "post".to_string(),
            target_id: 1,
            reply_id: 0,
            root_id: 1,
            depth: 0,
            content: "hi".to_string(),
            is_private: false,
            show_client_info: false,
            location: "Public network".to_string(),
            client_info: "Firefox on Linux".to_string(),
            like_count: 0,
            reply_count: 0,
            liked: false,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        assert_eq!(view.clone().redact_for(Some(7)).client_info, "Firefox on Linux");
        assert!(view.clone().redact_for(Some(8)).client_info.is_empty());
        assert!(view.redact_for(None).location.is_empty());
    }
}
