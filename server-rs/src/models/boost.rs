use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoostType {
    Profile,
    SuperBoost,
}

impl BoostType {
    pub fn as_str(self) -> &'static str {
        match self {
            BoostType::Profile => "profile",
            BoostType::SuperBoost => "super_boost",
        }
    }
}

impl fmt::Display for BoostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoostType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "profile" => Ok(BoostType::Profile),
            "super_boost" => Ok(BoostType::SuperBoost),
            other => Err(format!("Unknown boost type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProfileBoost {
    pub id: Uuid,
    pub user_id: Uuid,
    pub boost_type: String,
    pub duration_minutes: i32,
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
}

impl ProfileBoost {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.ends_at > now
    }

    pub fn remaining_minutes(&self, now: DateTime<Utc>) -> i64 {
        (self.ends_at - now).num_minutes().max(0)
    }
}

#[derive(Debug, Clone)]
pub struct NewBoost {
    pub user_id: Uuid,
    pub boost_type: BoostType,
    pub duration_minutes: u32,
    pub started_at: DateTime<Utc>,
}

impl NewBoost {
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.started_at + Duration::minutes(i64::from(self.duration_minutes))
    }
}

#[derive(Debug, Deserialize)]
pub struct ActivateBoostRequest {
    #[serde(rename = "boostType")]
    pub boost_type: Option<BoostType>,
}
