// src/services/mod.rs

//! The engagement engine: comment threads, likes and the counters derived
//! from them.
//!
//! Each component receives the pool and its collaborators through its
//! constructor. Every mutating operation runs in a single transaction;
//! dropping the operation's future before it commits rolls the whole
//! transaction back.

pub mod comments;
pub mod counters;
pub mod likes;
pub mod posts;
pub mod targets;
pub mod visibility;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::EngineSettings;
use comments::CommentStore;
use counters::CounterLedger;
use likes::LikeToggle;
use posts::PostStats;
use targets::{SqlTargetDirectory, TargetDirectory};
use visibility::VisibilityResolver;

/// All engine components, wired to one pool.
#[derive(Clone)]
pub struct Engagement {
    pub comments: CommentStore,
    pub visibility: VisibilityResolver,
    pub likes: LikeToggle,
    pub posts: PostStats,
    pub settings: EngineSettings,
}

impl Engagement {
    /// Wires the engine against the local `posts` table.
    pub fn new(pool: SqlitePool, settings: EngineSettings) -> Self {
        Self::with_targets(pool, settings, Arc::new(SqlTargetDirectory))
    }

    pub fn with_targets(
        pool: SqlitePool,
        settings: EngineSettings,
        targets: Arc<dyn TargetDirectory>,
    ) -> Self {
        let ledger = CounterLedger::new(settings.heat);

        Self {
            comments: CommentStore::new(
                pool.clone(),
                ledger,
                targets.clone(),
                settings.max_reply_depth,
            ),
            visibility: VisibilityResolver::new(pool.clone(), targets.clone()),
            likes: LikeToggle::new(pool.clone(), ledger, targets, settings.liked_users_max),
            posts: PostStats::new(pool, ledger),
            settings,
        }
    }
}
