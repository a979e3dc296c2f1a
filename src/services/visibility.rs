// src/services/visibility.rs

use std::sync::Arc;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    error::{AppError, Result},
    models::{
        comment::{CommentPage, CommentQuery, CommentView, TargetKind, TargetRef},
        user::Viewer,
    },
    services::targets::TargetDirectory,
};

/// Which comments of a target a viewer may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Anonymous viewers: public comments only.
    PublicOnly,
    /// The target's owner: everything.
    Everything,
    /// Other users: public comments plus private threads they took part in.
    Participant(i64),
}

impl Scope {
    pub fn resolve(viewer: Viewer, target_owner: Option<i64>) -> Self {
        match viewer.user_id {
            None => Scope::PublicOnly,
            Some(id) if Some(id) == target_owner => Scope::Everything,
            Some(id) => Scope::Participant(id),
        }
    }

    /// Appends the scope's predicate (prefixed with ` AND`) for the comments
    /// aliased `c` on `target`.
    fn push_filter(&self, builder: &mut QueryBuilder<'_, Sqlite>, target: TargetRef) {
        match *self {
            Scope::PublicOnly => {
                builder.push(" AND c.is_private = 0");
            }
            Scope::Everything => {}
            Scope::Participant(user_id) => {
                builder
                    .push(" AND (c.is_private = 0 OR c.root_id IN (SELECT p.root_id FROM comments p WHERE p.user_id = ")
                    .push_bind(user_id)
                    .push(" AND p.target_type = ")
                    .push_bind(target.kind.as_str())
                    .push(" AND p.target_id = ")
                    .push_bind(target.id)
                    .push("))");
            }
        }
    }
}

const VIEW_COLUMNS: &str = r#"
    c.id, c.user_id, u.username, c.target_type, c.target_id,
    c.reply_id, c.root_id, c.depth, c.content, c.is_private, c.show_client_info,
    c.location, c.client_info, c.like_count, c.reply_count,
    EXISTS(
        SELECT 1 FROM likes l
        WHERE l.target_type = 'comment' AND l.target_id = c.id AND l.user_id = "#;

/// Visibility Resolver: per-viewer reads of comments.
#[derive(Clone)]
pub struct VisibilityResolver {
    pool: SqlitePool,
    targets: Arc<dyn TargetDirectory>,
}

impl VisibilityResolver {
    pub fn new(pool: SqlitePool, targets: Arc<dyn TargetDirectory>) -> Self {
        Self { pool, targets }
    }

    /// Lists one page of the target's comments visible to `viewer`.
    #[tracing::instrument(skip(self, query), fields(target_id = query.target.id))]
    pub async fn list(&self, viewer: Viewer, query: &CommentQuery) -> Result<CommentPage> {
        if query.target.kind != TargetKind::Post {
            return Err(AppError::InvalidTarget);
        }

        let mut conn = self.pool.acquire().await?;

        let owner = self
            .targets
            .owner_of(&mut *conn, query.target)
            .await?
            .ok_or(AppError::InvalidTarget)?;
        let scope = Scope::resolve(viewer, Some(owner));

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM comments c");
        push_where(&mut count, query, scope);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&mut *conn)
            .await?;

        let mut select = QueryBuilder::<Sqlite>::new("SELECT");
        push_view_columns(&mut select, viewer);
        select.push(" FROM comments c LEFT JOIN users u ON u.id = c.user_id");
        push_where(&mut select, query, scope);
        select
            .push(format!(
                " ORDER BY {col} {dir}, c.id {dir} LIMIT ",
                col = query.order_by.column(),
                dir = query.direction.keyword()
            ))
            .push_bind(query.page_size)
            .push(" OFFSET ")
            .push_bind(query.offset());

        let items = select
            .build_query_as::<CommentView>()
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .map(|view| view.redact_for(viewer.user_id))
            .collect();

        Ok(CommentPage {
            total,
            page: query.page,
            page_size: query.page_size,
            items,
        })
    }

    /// Fetches a single comment. A private comment the viewer may not read is
    /// reported as `NotFound`.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, viewer: Viewer, comment_id: i64) -> Result<CommentView> {
        let mut conn = self.pool.acquire().await?;

        let mut select = QueryBuilder::<Sqlite>::new("SELECT");
        push_view_columns(&mut select, viewer);
        select
            .push(" FROM comments c LEFT JOIN users u ON u.id = c.user_id WHERE c.id = ")
            .push_bind(comment_id);

        let view = select
            .build_query_as::<CommentView>()
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(AppError::NotFound)?;

        if view.is_private {
            let target = TargetRef {
                kind: view.target_type.parse()?,
                id: view.target_id,
            };
            let owner = self.targets.owner_of(&mut *conn, target).await?;

            let visible = match Scope::resolve(viewer, owner) {
                Scope::PublicOnly => false,
                Scope::Everything => true,
                Scope::Participant(user_id) => sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM comments WHERE user_id = $1 AND root_id = $2)",
                )
                .bind(user_id)
                .bind(view.root_id)
                .fetch_one(&mut *conn)
                .await?,
            };

            if !visible {
                return Err(AppError::NotFound);
            }
        }

        Ok(view.redact_for(viewer.user_id))
    }
}

fn push_view_columns(builder: &mut QueryBuilder<'_, Sqlite>, viewer: Viewer) {
    // Anonymous viewers bind 0, which matches no user.
    builder
        .push(VIEW_COLUMNS)
        .push_bind(viewer.user_id.unwrap_or(0))
        .push(") AS liked, c.created_at, c.updated_at");
}

fn push_where(builder: &mut QueryBuilder<'_, Sqlite>, query: &CommentQuery, scope: Scope) {
    builder
        .push(" WHERE c.target_type = ")
        .push_bind(query.target.kind.as_str())
        .push(" AND c.target_id = ")
        .push_bind(query.target.id);

    if let Some(parent_id) = query.parent_id {
        builder.push(" AND c.reply_id = ").push_bind(parent_id);
    }
    if let Some(depth) = query.depth {
        builder.push(" AND c.depth = ").push_bind(depth);
    }

    scope.push_filter(builder, query.target);
}
