// src/services/counters.rs

//! Counter Ledger.
//!
//! Every primitive takes the caller's open transaction; counters are only
//! ever touched alongside the rows they summarize. Totals are re-derived
//! with `COUNT(*)` rather than adjusted in application code, and the
//! per-parent reply counter is adjusted with a single atomic `UPDATE`.

use sqlx::{Sqlite, Transaction};

use crate::{
    config::HeatWeights,
    error::{AppError, Result},
    models::comment::{TargetKind, TargetRef},
};

#[derive(Debug, Clone, Copy)]
pub struct CounterLedger {
    weights: HeatWeights,
}

impl CounterLedger {
    pub fn new(weights: HeatWeights) -> Self {
        Self { weights }
    }

    pub async fn increment_reply(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        parent_id: i64,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE comments SET reply_count = reply_count + 1 WHERE id = $1")
            .bind(parent_id)
            .execute(&mut **tx)
            .await?;

        expect_one_row(result.rows_affected(), "reply count", parent_id)
    }

    /// Floors at zero.
    pub async fn decrement_reply(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        parent_id: i64,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE comments SET reply_count = MAX(reply_count - 1, 0) WHERE id = $1",
        )
        .bind(parent_id)
        .execute(&mut **tx)
        .await?;

        expect_one_row(result.rows_affected(), "reply count", parent_id)
    }

    /// Re-derives the target's comment total from the live rows and returns it.
    pub async fn recount_target_comments(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        target: TargetRef,
    ) -> Result<i64> {
        if target.kind != TargetKind::Post {
            return Err(AppError::InvalidTarget);
        }

        let count = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE posts
            SET comment_count = (
                SELECT COUNT(*) FROM comments
                WHERE target_type = $1 AND target_id = $2
            )
            WHERE id = $2
            RETURNING comment_count
            "#,
        )
        .bind(target.kind.as_str())
        .bind(target.id)
        .fetch_optional(&mut **tx)
        .await?;

        count.ok_or_else(|| missing_row("comment count", target.id))
    }

    /// Re-derives the target's like total from the live rows and returns it.
    pub async fn recount_likes(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        target: TargetRef,
    ) -> Result<i64> {
        let table = match target.kind {
            TargetKind::Post => "posts",
            TargetKind::Comment => "comments",
        };

        let sql = format!(
            r#"
            UPDATE {table}
            SET like_count = (
                SELECT COUNT(*) FROM likes
                WHERE target_type = $1 AND target_id = $2
            )
            WHERE id = $2
            RETURNING like_count
            "#
        );

        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(target.kind.as_str())
            .bind(target.id)
            .fetch_optional(&mut **tx)
            .await?;

        count.ok_or_else(|| missing_row("like count", target.id))
    }

    pub async fn increment_views(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        post_id: i64,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE posts SET view_count = view_count + 1 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::InvalidTarget);
        }
        Ok(())
    }

    /// Writes the weighted heat score from the post's current counters.
    ///
    /// Callers have already written in `tx`, so the post row cannot change
    /// between the read and the write.
    pub async fn recompute_heat(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        post_id: i64,
    ) -> Result<i64> {
        let (likes, comments, views) = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT like_count, comment_count, view_count FROM posts WHERE id = $1",
        )
        .bind(post_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| missing_row("heat", post_id))?;

        let heat = self.weights.score(likes, comments, views);

        let result = sqlx::query("UPDATE posts SET heat = $1 WHERE id = $2")
            .bind(heat)
            .bind(post_id)
            .execute(&mut **tx)
            .await?;
        expect_one_row(result.rows_affected(), "heat", post_id)?;

        Ok(heat)
    }
}

fn expect_one_row(rows: u64, counter: &str, id: i64) -> Result<()> {
    if rows == 0 {
        return Err(missing_row(counter, id));
    }
    Ok(())
}

fn missing_row(counter: &str, id: i64) -> AppError {
    tracing::error!("{} update matched no row for id {}", counter, id);
    AppError::InternalInconsistency(format!("{counter} update matched no row for id {id}"))
}
