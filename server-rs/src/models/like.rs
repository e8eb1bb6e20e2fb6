use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Remaining;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Swipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_user_id: Uuid,
    pub direction: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Swipe {
    pub const RIGHT: &'static str = "right";

    pub fn is_like(&self) -> bool {
        self.direction == Self::RIGHT
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Match {
    pub id: Uuid,
    pub user1_id: Uuid,
    pub user2_id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResult {
    pub swipe_id: Uuid,
    pub super_like: bool,
    pub is_match: bool,
    pub match_id: Option<Uuid>,
    pub remaining: Remaining,
}
