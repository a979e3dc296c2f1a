// src/services/targets.rs

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::{
    error::Result,
    models::comment::{TargetKind, TargetRef},
};

/// Existence and ownership lookups for the entities comments and likes
/// attach to.
///
/// Calls receive the caller's connection so the check runs inside the
/// caller's transaction.
#[async_trait]
pub trait TargetDirectory: Send + Sync {
    /// Author of the target, or `None` when it does not exist.
    async fn owner_of(&self, conn: &mut SqliteConnection, target: TargetRef)
    -> Result<Option<i64>>;

    async fn exists(&self, conn: &mut SqliteConnection, target: TargetRef) -> Result<bool> {
        Ok(self.owner_of(conn, target).await?.is_some())
    }
}

/// Looks targets up in the local `posts` and `comments` tables.
/// Soft-deleted posts do not exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlTargetDirectory;

#[async_trait]
impl TargetDirectory for SqlTargetDirectory {
    async fn owner_of(
        &self,
        conn: &mut SqliteConnection,
        target: TargetRef,
    ) -> Result<Option<i64>> {
        let sql = match target.kind {
            TargetKind::Post => "SELECT user_id FROM posts WHERE id = $1 AND deleted_at IS NULL",
            TargetKind::Comment => "SELECT user_id FROM comments WHERE id = $1",
        };

        let owner = sqlx::query_scalar::<_, i64>(sql)
            .bind(target.id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(owner)
    }
}
