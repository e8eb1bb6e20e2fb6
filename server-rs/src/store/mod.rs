use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Match, NewBoost, ProfileBoost, ProfileUsage, Swipe, UsagePatch};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn fetch_usage(&self, user_id: Uuid) -> AppResult<Option<ProfileUsage>>;

    /// Writes only the fields present in `patch`.
    async fn update_usage(&self, user_id: Uuid, patch: &UsagePatch) -> AppResult<()>;

    async fn ping(&self) -> bool;
}

#[async_trait]
pub trait BoostStore: Send + Sync {
    async fn active_boost(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<Option<ProfileBoost>>;

    async fn deactivate_boosts(&self, user_id: Uuid) -> AppResult<u64>;

    async fn insert_boost(&self, boost: &NewBoost) -> AppResult<ProfileBoost>;
}

#[async_trait]
pub trait LikeStore: Send + Sync {
    /// Any earlier swipe by `user_id` on `target_user_id`, in either direction.
    async fn find_swipe(&self, user_id: Uuid, target_user_id: Uuid) -> AppResult<Option<Swipe>>;

    /// Stores a right swipe, plus a `super_likes` row when `super_like` is set.
    async fn insert_like(&self, user_id: Uuid, target_user_id: Uuid, super_like: bool) -> AppResult<Swipe>;

    async fn insert_match(&self, user1_id: Uuid, user2_id: Uuid) -> AppResult<Match>;
}
