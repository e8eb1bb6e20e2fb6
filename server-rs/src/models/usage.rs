use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::tier::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Like,
    #[serde(rename = "superlike")]
    SuperLike,
    Boost,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Like, Action::SuperLike, Action::Boost];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Like => "like",
            Action::SuperLike => "superlike",
            Action::Boost => "boost",
        }
    }

    /// Column on `profiles` holding today's count for this action.
    pub fn column(self) -> &'static str {
        match self {
            Action::Like => "daily_likes_used",
            Action::SuperLike => "daily_super_likes_used",
            Action::Boost => "daily_boosts_used",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "like" | "likes" => Ok(Action::Like),
            "superlike" | "superlikes" | "super_like" | "super-like" => Ok(Action::SuperLike),
            "boost" | "boosts" => Ok(Action::Boost),
            _ => Err(format!("Unknown action '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub user_id: Uuid,
    pub likes_used: u32,
    pub super_likes_used: u32,
    pub boosts_used: u32,
    pub last_reset: Option<DateTime<Utc>>,
}

impl UsageRecord {
    pub fn fresh(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            likes_used: 0,
            super_likes_used: 0,
            boosts_used: 0,
            last_reset: Some(now),
        }
    }

    pub fn used(&self, action: Action) -> u32 {
        match action {
            Action::Like => self.likes_used,
            Action::SuperLike => self.super_likes_used,
            Action::Boost => self.boosts_used,
        }
    }

    pub fn used_mut(&mut self, action: Action) -> &mut u32 {
        match action {
            Action::Like => &mut self.likes_used,
            Action::SuperLike => &mut self.super_likes_used,
            Action::Boost => &mut self.boosts_used,
        }
    }

    /// Counters are per calendar day (UTC), not a rolling window.
    pub fn is_stale(&self, today: NaiveDate) -> bool {
        match self.last_reset {
            Some(ts) => ts.date_naive() != today,
            None => true,
        }
    }

    pub fn apply(&mut self, patch: &UsagePatch) {
        if let Some(v) = patch.likes_used {
            self.likes_used = v;
        }
        if let Some(v) = patch.super_likes_used {
            self.super_likes_used = v;
        }
        if let Some(v) = patch.boosts_used {
            self.boosts_used = v;
        }
        if let Some(ts) = patch.last_reset {
            self.last_reset = Some(ts);
        }
    }
}

/// Partial write against a usage record. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsagePatch {
    pub likes_used: Option<u32>,
    pub super_likes_used: Option<u32>,
    pub boosts_used: Option<u32>,
    pub last_reset: Option<DateTime<Utc>>,
}

impl UsagePatch {
    pub fn reset(now: DateTime<Utc>) -> Self {
        Self {
            likes_used: Some(0),
            super_likes_used: Some(0),
            boosts_used: Some(0),
            last_reset: Some(now),
        }
    }

    pub fn counter(action: Action, value: u32) -> Self {
        let mut patch = Self::default();
        match action {
            Action::Like => patch.likes_used = Some(value),
            Action::SuperLike => patch.super_likes_used = Some(value),
            Action::Boost => patch.boosts_used = Some(value),
        }
        patch
    }

    pub fn is_empty(&self) -> bool {
        self.likes_used.is_none()
            && self.super_likes_used.is_none()
            && self.boosts_used.is_none()
            && self.last_reset.is_none()
    }

    /// Column/value pairs for the counters present in this patch.
    pub fn counters(&self) -> Vec<(&'static str, u32)> {
        Action::ALL
            .into_iter()
            .filter_map(|action| {
                let value = match action {
                    Action::Like => self.likes_used,
                    Action::SuperLike => self.super_likes_used,
                    Action::Boost => self.boosts_used,
                };
                value.map(|v| (action.column(), v))
            })
            .collect()
    }
}

/// A `profiles` row as read for gating.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileUsage {
    pub id: Uuid,
    pub subscription_tier: Option<String>,
    pub role: Option<String>,
    pub daily_likes_used: Option<i32>,
    pub daily_super_likes_used: Option<i32>,
    pub daily_boosts_used: Option<i32>,
    pub last_like_reset_date: Option<DateTime<Utc>>,
}

impl ProfileUsage {
    pub fn tier(&self) -> Tier {
        Tier::resolve(self.subscription_tier.as_deref(), self.role.as_deref())
    }

    pub fn usage(&self) -> UsageRecord {
        let count = |v: Option<i32>| v.unwrap_or(0).max(0) as u32;
        UsageRecord {
            user_id: self.id,
            likes_used: count(self.daily_likes_used),
            super_likes_used: count(self.daily_super_likes_used),
            boosts_used: count(self.daily_boosts_used),
            last_reset: self.last_like_reset_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn staleness_is_by_calendar_date() {
        let mut record = UsageRecord::fresh(Uuid::new_v4(), at(2024, 1, 1, 23));
        let jan1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let jan2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        assert!(!record.is_stale(jan1));
        // one hour later, but a new day
        assert!(record.is_stale(jan2));

        record.last_reset = None;
        assert!(record.is_stale(jan1));
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut record = UsageRecord::fresh(Uuid::new_v4(), at(2024, 3, 5, 8));
        record.likes_used = 4;
        record.boosts_used = 1;

        record.apply(&UsagePatch::counter(Action::SuperLike, 2));
        assert_eq!((record.likes_used, record.super_likes_used, record.boosts_used), (4, 2, 1));

        let patch = UsagePatch::counter(Action::Like, 5);
        assert_eq!(patch.counters(), vec![("daily_likes_used", 5)]);
        assert!(patch.last_reset.is_none());
        assert!(UsagePatch::default().is_empty());
    }

    #[test]
    fn profile_row_clamps_bad_counts() {
        let row = ProfileUsage {
            id: Uuid::new_v4(),
            subscription_tier: Some("silver".into()),
            role: None,
            daily_likes_used: Some(-2),
            daily_super_likes_used: None,
            daily_boosts_used: Some(1),
            last_like_reset_date: None,
        };
        let usage = row.usage();
        assert_eq!(usage.likes_used, 0);
        assert_eq!(usage.super_likes_used, 0);
        assert_eq!(usage.boosts_used, 1);
        assert_eq!(row.tier(), Tier::Silver);
    }

    #[test]
    fn action_parsing() {
        assert_eq!("superlike".parse::<Action>(), Ok(Action::SuperLike));
        assert_eq!("Likes".parse::<Action>(), Ok(Action::Like));
        assert!("wink".parse::<Action>().is_err());
    }
}
