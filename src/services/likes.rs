// src/services/likes.rs

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    db,
    error::{AppError, Result},
    models::{
        comment::{TargetKind, TargetRef},
        user::{UserSummary, Viewer},
    },
    services::{counters::CounterLedger, targets::TargetDirectory},
};

const DEFAULT_LIKED_USERS: i64 = 20;

/// Engagement Toggle: like state per `(user, target)`, held solely by the
/// existence of a `likes` row.
#[derive(Clone)]
pub struct LikeToggle {
    pool: SqlitePool,
    ledger: CounterLedger,
    targets: Arc<dyn TargetDirectory>,
    liked_users_max: i64,
}

impl LikeToggle {
    pub fn new(
        pool: SqlitePool,
        ledger: CounterLedger,
        targets: Arc<dyn TargetDirectory>,
        liked_users_max: i64,
    ) -> Self {
        Self {
            pool,
            ledger,
            targets,
            liked_users_max,
        }
    }

    /// Flips the like state and returns the new one. Calling it twice
    /// restores the original state.
    #[tracing::instrument(skip(self))]
    pub async fn toggle(&self, viewer: Viewer, target: TargetRef) -> Result<bool> {
        let user_id = viewer.require()?;

        let mut tx = db::begin_write(&self.pool).await?;

        if !self.targets.exists(&mut *tx, target).await? {
            return Err(AppError::InvalidTarget);
        }

        // 1. Unlike if a row exists
        let removed = sqlx::query(
            "DELETE FROM likes WHERE target_type = $1 AND target_id = $2 AND user_id = $3",
        )
        .bind(target.kind.as_str())
        .bind(target.id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let liked = if removed > 0 {
            false
        } else {
            // 2. Like
            let inserted = sqlx::query(
                r#"
                INSERT INTO likes (target_type, target_id, user_id, created_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (target_type, target_id, user_id) DO NOTHING
                "#,
            )
            .bind(target.kind.as_str())
            .bind(target.id)
            .bind(user_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted == 0 {
                return Err(AppError::InternalInconsistency(
                    "like row appeared during toggle".to_string(),
                ));
            }
            true
        };

        // 3. Counters
        let likes = self.ledger.recount_likes(&mut tx, target).await?;
        if target.kind == TargetKind::Post {
            self.ledger.recompute_heat(&mut tx, target.id).await?;
        }

        tx.commit().await?;

        tracing::debug!(user_id, liked, likes, "like toggled");
        Ok(liked)
    }

    /// Anonymous viewers have liked nothing.
    pub async fn is_liked(&self, viewer: Viewer, target: TargetRef) -> Result<bool> {
        let Some(user_id) = viewer.user_id else {
            return Ok(false);
        };

        let liked = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM likes
                WHERE target_type = $1 AND target_id = $2 AND user_id = $3
            )
            "#,
        )
        .bind(target.kind.as_str())
        .bind(target.id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(liked)
    }

    /// Users who liked the target, most recent first, one entry per user.
    /// `limit` defaults to 20 and is clamped to the configured maximum.
    pub async fn liked_users(&self, target: TargetRef, limit: Option<i64>) -> Result<Vec<UserSummary>> {
        let limit = limit
            .unwrap_or(DEFAULT_LIKED_USERS)
            .clamp(1, self.liked_users_max.max(1));

        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username
            FROM likes l
            JOIN users u ON u.id = l.user_id
            WHERE l.target_type = $1 AND l.target_id = $2
            GROUP BY u.id, u.username
            ORDER BY MAX(l.created_at) DESC, u.id DESC
            LIMIT $3
            "#,
        )
        .bind(target.kind.as_str())
        .bind(target.id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
