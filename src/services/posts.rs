// src/services/posts.rs

use sqlx::SqlitePool;

use crate::{
    db,
    error::{AppError, Result},
    models::post::PostCounters,
    services::counters::CounterLedger,
};

/// View recording and counter reads for posts.
#[derive(Clone)]
pub struct PostStats {
    pool: SqlitePool,
    ledger: CounterLedger,
}

impl PostStats {
    pub fn new(pool: SqlitePool, ledger: CounterLedger) -> Self {
        Self { pool, ledger }
    }

    /// Counts one view and returns the post's refreshed counters.
    pub async fn record_view(&self, post_id: i64) -> Result<PostCounters> {
        let mut tx = db::begin_write(&self.pool).await?;

        self.ledger.increment_views(&mut tx, post_id).await?;
        self.ledger.recompute_heat(&mut tx, post_id).await?;

        let counters = fetch_counters(&mut *tx, post_id).await?;

        tx.commit().await?;

        Ok(counters)
    }

    pub async fn counters(&self, post_id: i64) -> Result<PostCounters> {
        let mut conn = self.pool.acquire().await?;
        fetch_counters(&mut *conn, post_id).await
    }
}

async fn fetch_counters(conn: &mut sqlx::SqliteConnection, post_id: i64) -> Result<PostCounters> {
    sqlx::query_as::<_, PostCounters>(
        r#"
        SELECT id, like_count, comment_count, view_count, heat
        FROM posts
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(post_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::NotFound)
}
