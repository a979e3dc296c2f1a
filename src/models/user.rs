// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Public projection of a row in the 'users' table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
}

/// Identity resolved for the current call.
///
/// Supplied by the identity middleware; the engine only authorizes against
/// it and never authenticates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Option<i64>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn user(id: i64) -> Self {
        Self { user_id: Some(id) }
    }

    /// The authenticated user id, or `Unauthorized`.
    pub fn require(&self) -> Result<i64, crate::error::AppError> {
        self.user_id.ok_or(crate::error::AppError::Unauthorized)
    }
}
