use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Denormalized counters of a row in the 'posts' table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PostCounters {
    pub id: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub view_count: i64,
    pub heat: i64,
}
