// src/services/comments.rs

use std::sync::Arc;

use chrono::Utc;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool, Transaction};

use crate::{
    db,
    error::{AppError, Result},
    models::comment::{ClientMeta, Comment, TargetKind, TargetRef},
    services::{counters::CounterLedger, targets::TargetDirectory},
    utils::{client, html::clean_comment_content},
};

/// Input of `CommentStore::create`.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub target: TargetRef,
    /// Parent comment, `None` or `0` for a root comment.
    pub reply_id: Option<i64>,
    pub content: String,
    pub is_private: bool,
    pub show_client_info: bool,
    pub client: ClientMeta,
}

/// The mutable part of a comment.
#[derive(Debug, Clone)]
pub struct CommentEdit {
    pub content: String,
    pub is_private: bool,
    pub show_client_info: bool,
}

#[derive(Debug, FromRow)]
struct ParentRow {
    id: i64,
    root_id: i64,
    depth: i64,
    is_private: bool,
}

/// Position of a new comment in its thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placement {
    reply_id: i64,
    /// `0` until the row exists when the comment is a root.
    root_id: i64,
    depth: i64,
    is_private: bool,
}

/// Comment Tree Store: owns comment rows and keeps the thread structure
/// (depth, root linkage, privacy cascade) and the dependent counters
/// consistent.
#[derive(Clone)]
pub struct CommentStore {
    pool: SqlitePool,
    ledger: CounterLedger,
    targets: Arc<dyn TargetDirectory>,
    max_depth: i64,
}

impl CommentStore {
    pub fn new(
        pool: SqlitePool,
        ledger: CounterLedger,
        targets: Arc<dyn TargetDirectory>,
        max_depth: i64,
    ) -> Self {
        Self {
            pool,
            ledger,
            targets,
            max_depth,
        }
    }

    /// Creates a comment and returns its id.
    ///
    /// Row insert, root self-reference, parent reply count, target comment
    /// count and heat are written in one transaction.
    #[tracing::instrument(skip(self, new), fields(target = %new.target.kind, target_id = new.target.id))]
    pub async fn create(&self, author: i64, new: NewComment) -> Result<i64> {
        let content = clean_comment_content(&new.content)?;
        if new.target.kind != TargetKind::Post {
            return Err(AppError::InvalidTarget);
        }

        let mut tx = db::begin_write(&self.pool).await?;

        let owner = self
            .targets
            .owner_of(&mut *tx, new.target)
            .await?
            .ok_or(AppError::InvalidTarget)?;

        let placement = self.place(&mut tx, author, owner, &new).await?;

        let now = Utc::now();
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO comments (
                user_id, target_type, target_id, reply_id, root_id, depth,
                content, is_private, show_client_info,
                remote_addr, location, user_agent, client_info,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
            RETURNING id
            "#,
        )
        .bind(author)
        .bind(new.target.kind.as_str())
        .bind(new.target.id)
        .bind(placement.reply_id)
        .bind(placement.root_id)
        .bind(placement.depth)
        .bind(&content)
        .bind(placement.is_private)
        .bind(new.show_client_info)
        .bind(&new.client.remote_addr)
        .bind(client::classify_address(&new.client.remote_addr))
        .bind(&new.client.user_agent)
        .bind(client::describe_user_agent(&new.client.user_agent))
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        if placement.reply_id == 0 {
            // A root references itself; the id only exists after the insert.
            sqlx::query("UPDATE comments SET root_id = id WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        } else {
            self.ledger
                .increment_reply(&mut tx, placement.reply_id)
                .await?;
        }

        self.ledger
            .recount_target_comments(&mut tx, new.target)
            .await?;
        self.ledger.recompute_heat(&mut tx, new.target.id).await?;

        tx.commit().await?;

        tracing::info!(
            comment_id = id,
            reply_id = placement.reply_id,
            depth = placement.depth,
            "comment created"
        );
        Ok(id)
    }

    /// Resolves reply id, root, depth and effective privacy for a new comment.
    ///
    /// A private parent the author may not read is reported as
    /// `ParentNotFound`, the same as a missing one.
    async fn place(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        author: i64,
        target_owner: i64,
        new: &NewComment,
    ) -> Result<Placement> {
        let parent_id = match new.reply_id {
            Some(id) if id != 0 => id,
            _ => {
                return Ok(Placement {
                    reply_id: 0,
                    root_id: 0,
                    depth: 0,
                    is_private: new.is_private,
                });
            }
        };

        let parent = sqlx::query_as::<_, ParentRow>(
            r#"
            SELECT id, root_id, depth, is_private
            FROM comments
            WHERE id = $1 AND target_type = $2 AND target_id = $3
            "#,
        )
        .bind(parent_id)
        .bind(new.target.kind.as_str())
        .bind(new.target.id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(AppError::ParentNotFound)?;

        let root_id = if parent.root_id == 0 {
            parent.id
        } else {
            parent.root_id
        };

        if parent.is_private && author != target_owner {
            let participant = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM comments WHERE user_id = $1 AND root_id = $2)",
            )
            .bind(author)
            .bind(root_id)
            .fetch_one(&mut **tx)
            .await?;
            if !participant {
                return Err(AppError::ParentNotFound);
            }
        }

        let depth = parent.depth + 1;
        if depth > self.max_depth {
            return Err(AppError::DepthExceeded {
                depth,
                max: self.max_depth,
            });
        }

        Ok(Placement {
            reply_id: parent.id,
            root_id,
            depth,
            // Replies under a private comment are private, whatever was asked.
            is_private: new.is_private || parent.is_private,
        })
    }

    /// Edits content and flags. Only the author may edit; the new privacy
    /// value is not propagated to existing replies.
    #[tracing::instrument(skip(self, edit))]
    pub async fn update(&self, author: i64, comment_id: i64, edit: CommentEdit) -> Result<()> {
        let content = clean_comment_content(&edit.content)?;

        let mut tx = db::begin_write(&self.pool).await?;

        let owner = sqlx::query_scalar::<_, i64>("SELECT user_id FROM comments WHERE id = $1")
            .bind(comment_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound)?;

        if owner != author {
            return Err(AppError::Forbidden);
        }

        sqlx::query(
            r#"
            UPDATE comments
            SET content = $1, is_private = $2, show_client_info = $3, updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(&content)
        .bind(edit.is_private)
        .bind(edit.show_client_info)
        .bind(Utc::now())
        .bind(comment_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Deletes a comment and its whole subtree, then fixes the parent's
    /// reply count and the target's totals. Returns the number of comments
    /// removed.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, author: i64, comment_id: i64) -> Result<u64> {
        let mut tx = db::begin_write(&self.pool).await?;

        let row = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
            .bind(comment_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound)?;

        if row.user_id != author {
            return Err(AppError::Forbidden);
        }

        let target = TargetRef {
            kind: row.target_type.parse()?,
            id: row.target_id,
        };

        let doomed = self.collect_subtree(&mut tx, &row).await?;

        let mut likes = QueryBuilder::<Sqlite>::new(
            "DELETE FROM likes WHERE target_type = 'comment' AND target_id IN (",
        );
        push_id_list(&mut likes, &doomed);
        likes.build().execute(&mut *tx).await?;

        let mut comments = QueryBuilder::<Sqlite>::new("DELETE FROM comments WHERE id IN (");
        push_id_list(&mut comments, &doomed);
        let removed = comments.build().execute(&mut *tx).await?.rows_affected();

        if removed != doomed.len() as u64 {
            return Err(AppError::InternalInconsistency(format!(
                "expected to delete {} comments, deleted {}",
                doomed.len(),
                removed
            )));
        }

        if !row.is_root() {
            self.ledger.decrement_reply(&mut tx, row.reply_id).await?;
        }
        self.ledger.recount_target_comments(&mut tx, target).await?;
        self.ledger.recompute_heat(&mut tx, target.id).await?;

        tx.commit().await?;

        tracing::info!(comment_id, removed, "comment subtree deleted");
        Ok(removed)
    }

    /// Collects the comment and all of its descendants, one tree level per
    /// query. The number of levels is bounded by the reply depth limit (or
    /// the deepest stored reply of the thread, if that is larger).
    async fn collect_subtree(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        row: &Comment,
    ) -> Result<Vec<i64>> {
        let deepest = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT MAX(depth) FROM comments WHERE root_id = $1",
        )
        .bind(row.root_id)
        .fetch_one(&mut **tx)
        .await?
        .unwrap_or(row.depth);
        let levels = self.max_depth.max(deepest) - row.depth;

        let mut doomed = vec![row.id];
        let mut frontier = vec![row.id];

        for _ in 0..levels {
            if frontier.is_empty() {
                break;
            }
            let mut query =
                QueryBuilder::<Sqlite>::new("SELECT id FROM comments WHERE reply_id IN (");
            push_id_list(&mut query, &frontier);
            frontier = query
                .build_query_scalar::<i64>()
                .fetch_all(&mut **tx)
                .await?;
            doomed.extend_from_slice(&frontier);
        }

        Ok(doomed)
    }
}

/// Appends `?, ?, ...)` binding every id.
fn push_id_list(builder: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}
