use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{BoostStore, LikeStore, UsageStore};
use crate::error::{AppError, AppResult};
use crate::models::{Match, NewBoost, ProfileBoost, ProfileUsage, Swipe, UsagePatch};

/// In-process store used by tests. Failures can be injected per call.
#[derive(Default)]
pub struct MemoryStore {
    profiles: Mutex<HashMap<Uuid, ProfileUsage>>,
    boosts: Mutex<Vec<ProfileBoost>>,
    swipes: Mutex<Vec<Swipe>>,
    super_likes: Mutex<Vec<(Uuid, Uuid)>>,
    matches: Mutex<Vec<Match>>,
    fail_matches: AtomicUsize,
    fail_updates: AtomicUsize,
    update_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_profile(&self, profile: ProfileUsage) {
        self.profiles.lock().await.insert(profile.id, profile);
    }

    pub async fn profile(&self, user_id: Uuid) -> Option<ProfileUsage> {
        self.profiles.lock().await.get(&user_id).cloned()
    }

    pub async fn boosts(&self) -> Vec<ProfileBoost> {
        self.boosts.lock().await.clone()
    }

    pub async fn insert_swipe(&self, user_id: Uuid, target_user_id: Uuid, direction: &str) {
        self.swipes.lock().await.push(Swipe {
            id: Uuid::new_v4(),
            user_id,
            target_user_id,
            direction: direction.to_string(),
            created_at: Some(Utc::now()),
        });
    }

    pub async fn swipes(&self) -> Vec<Swipe> {
        self.swipes.lock().await.clone()
    }

    pub async fn super_likes(&self) -> Vec<(Uuid, Uuid)> {
        self.super_likes.lock().await.clone()
    }

    pub async fn matches(&self) -> Vec<Match> {
        self.matches.lock().await.clone()
    }

    pub fn fail_next_matches(&self, n: usize) {
        self.fail_matches.store(n, Ordering::SeqCst);
    }

    /// The next `n` calls to `update_usage` fail with a database error.
    pub fn fail_next_updates(&self, n: usize) {
        self.fail_updates.store(n, Ordering::SeqCst);
    }

    pub fn updates(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UsageStore for MemoryStore {
    async fn fetch_usage(&self, user_id: Uuid) -> AppResult<Option<ProfileUsage>> {
        Ok(self.profiles.lock().await.get(&user_id).cloned())
    }

    async fn update_usage(&self, user_id: Uuid, patch: &UsagePatch) -> AppResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let pending = self.fail_updates.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_updates.store(pending - 1, Ordering::SeqCst);
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut profiles = self.profiles.lock().await;
        let row = profiles
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;
        for (column, value) in patch.counters() {
            let value = Some(value as i32);
            match column {
                "daily_likes_used" => row.daily_likes_used = value,
                "daily_super_likes_used" => row.daily_super_likes_used = value,
                "daily_boosts_used" => row.daily_boosts_used = value,
                _ => unreachable!("unknown counter column {column}"),
            }
        }
        if let Some(ts) = patch.last_reset {
            row.last_like_reset_date = Some(ts);
        }
        Ok(())
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[async_trait]
impl BoostStore for MemoryStore {
    async fn active_boost(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<Option<ProfileBoost>> {
        Ok(self
            .boosts
            .lock()
            .await
            .iter()
            .filter(|b| b.user_id == user_id && b.is_live(now))
            .max_by_key(|b| b.ends_at)
            .cloned())
    }

    async fn deactivate_boosts(&self, user_id: Uuid) -> AppResult<u64> {
        let mut boosts = self.boosts.lock().await;
        let mut changed = 0;
        for boost in boosts.iter_mut().filter(|b| b.user_id == user_id && b.is_active) {
            boost.is_active = false;
            changed += 1;
        }
        Ok(changed)
    }

    async fn insert_boost(&self, boost: &NewBoost) -> AppResult<ProfileBoost> {
        let row = ProfileBoost {
            id: Uuid::new_v4(),
            user_id: boost.user_id,
            boost_type: boost.boost_type.as_str().to_string(),
            duration_minutes: boost.duration_minutes as i32,
            started_at: boost.started_at,
            ends_at: boost.ends_at(),
            is_active: true,
        };
        self.boosts.lock().await.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl LikeStore for MemoryStore {
    async fn find_swipe(&self, user_id: Uuid, target_user_id: Uuid) -> AppResult<Option<Swipe>> {
        Ok(self
            .swipes
            .lock()
            .await
            .iter()
            .find(|s| s.user_id == user_id && s.target_user_id == target_user_id)
            .cloned())
    }

    async fn insert_like(&self, user_id: Uuid, target_user_id: Uuid, super_like: bool) -> AppResult<Swipe> {
        let swipe = Swipe {
            id: Uuid::new_v4(),
            user_id,
            target_user_id,
            direction: Swipe::RIGHT.to_string(),
            created_at: Some(Utc::now()),
        };
        self.swipes.lock().await.push(swipe.clone());
        if super_like {
            self.super_likes.lock().await.push((user_id, target_user_id));
        }
        Ok(swipe)
    }

    async fn insert_match(&self, user1_id: Uuid, user2_id: Uuid) -> AppResult<Match> {
        let pending = self.fail_matches.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_matches.store(pending - 1, Ordering::SeqCst);
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }

        let row = Match {
            id: Uuid::new_v4(),
            user1_id,
            user2_id,
            created_at: Some(Utc::now()),
        };
        self.matches.lock().await.push(row.clone());
        Ok(row)
    }
}
