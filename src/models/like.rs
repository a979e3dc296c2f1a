use serde::{Deserialize, Serialize};

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub liked: bool,
}

/// Query parameters for listing the users who liked a target.
#[derive(Debug, Default, Deserialize)]
pub struct LikedUsersParams {
    pub limit: Option<i64>,
}
