use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{BoostStore, LikeStore, UsageStore};
use crate::error::{AppError, AppResult};
use crate::models::{Match, NewBoost, ProfileBoost, ProfileUsage, Swipe, UsagePatch};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `UPDATE profiles` touching only the columns present in `patch`.
fn usage_update(user_id: Uuid, patch: &UsagePatch) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE profiles SET ");
    {
        let mut set = qb.separated(", ");
        for (column, value) in patch.counters() {
            set.push(column)
                .push_unseparated(" = ")
                .push_bind_unseparated(value as i32);
        }
        if let Some(ts) = patch.last_reset {
            set.push("last_like_reset_date = ")
                .push_bind_unseparated(ts);
        }
    }
    qb.push(" WHERE id = ").push_bind(user_id);
    qb
}

#[async_trait]
impl UsageStore for PgStore {
    async fn fetch_usage(&self, user_id: Uuid) -> AppResult<Option<ProfileUsage>> {
        let row = sqlx::query_as::<_, ProfileUsage>(
            r#"SELECT id, subscription_tier, role, daily_likes_used, daily_super_likes_used,
                      daily_boosts_used, last_like_reset_date
               FROM profiles WHERE id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_usage(&self, user_id: Uuid, patch: &UsagePatch) -> AppResult<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut qb = usage_update(user_id, patch);
        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Profile not found".into()));
        }
        Ok(())
    }

    async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

#[async_trait]
impl BoostStore for PgStore {
    async fn active_boost(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<Option<ProfileBoost>> {
        let row = sqlx::query_as::<_, ProfileBoost>(
            r#"SELECT id, user_id, boost_type, duration_minutes, started_at, ends_at, is_active
               FROM profile_boosts
               WHERE user_id = $1 AND is_active = true AND ends_at > $2
               ORDER BY ends_at DESC
               LIMIT 1"#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn deactivate_boosts(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE profile_boosts SET is_active = false, updated_at = now() WHERE user_id = $1 AND is_active = true",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn insert_boost(&self, boost: &NewBoost) -> AppResult<ProfileBoost> {
        let row = sqlx::query_as::<_, ProfileBoost>(
            r#"INSERT INTO profile_boosts (id, user_id, boost_type, duration_minutes, started_at, ends_at, is_active)
               VALUES ($1, $2, $3, $4, $5, $6, true)
               RETURNING id, user_id, boost_type, duration_minutes, started_at, ends_at, is_active"#,
        )
        .bind(Uuid::new_v4())
        .bind(boost.user_id)
        .bind(boost.boost_type.as_str())
        .bind(boost.duration_minutes as i32)
        .bind(boost.started_at)
        .bind(boost.ends_at())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}

#[async_trait]
impl LikeStore for PgStore {
    async fn find_swipe(&self, user_id: Uuid, target_user_id: Uuid) -> AppResult<Option<Swipe>> {
        let row = sqlx::query_as::<_, Swipe>(
            r#"SELECT id, user_id, target_user_id, direction, created_at
               FROM swipes
               WHERE user_id = $1 AND target_user_id = $2
               LIMIT 1"#,
        )
        .bind(user_id)
        .bind(target_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn insert_like(&self, user_id: Uuid, target_user_id: Uuid, super_like: bool) -> AppResult<Swipe> {
        let mut tx = self.pool.begin().await?;

        let swipe = sqlx::query_as::<_, Swipe>(
            r#"INSERT INTO swipes (id, user_id, target_user_id, direction, created_at)
               VALUES ($1, $2, $3, $4, NOW())
               RETURNING id, user_id, target_user_id, direction, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(target_user_id)
        .bind(Swipe::RIGHT)
        .fetch_one(&mut *tx)
        .await?;

        if super_like {
            sqlx::query(
                "INSERT INTO super_likes (id, user_id, target_user_id, created_at) VALUES ($1, $2, $3, NOW())",
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(target_user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(swipe)
    }

    async fn insert_match(&self, user1_id: Uuid, user2_id: Uuid) -> AppResult<Match> {
        let row = sqlx::query_as::<_, Match>(
            r#"INSERT INTO matches (id, user1_id, user2_id, created_at)
               VALUES ($1, $2, $3, NOW())
               RETURNING id, user1_id, user2_id, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(user1_id)
        .bind(user2_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
