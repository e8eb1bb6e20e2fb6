use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::models::usage::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Registered,
    Silver,
    Gold,
    Platinum,
    Moderator,
    Admin,
}

/// Tiers a member can buy, cheapest first.
pub const PURCHASABLE_TIERS: [Tier; 4] = [Tier::Registered, Tier::Silver, Tier::Gold, Tier::Platinum];

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Registered => "registered",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
            Tier::Moderator => "moderator",
            Tier::Admin => "admin",
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Tier::Registered => 0,
            Tier::Silver => 1,
            Tier::Gold => 2,
            Tier::Platinum => 3,
            Tier::Moderator => 4,
            Tier::Admin => 5,
        }
    }

    pub fn parse(value: &str) -> Option<Tier> {
        match value.trim().to_ascii_lowercase().as_str() {
            "registered" => Some(Tier::Registered),
            "silver" => Some(Tier::Silver),
            "gold" => Some(Tier::Gold),
            "platinum" => Some(Tier::Platinum),
            "moderator" => Some(Tier::Moderator),
            "admin" => Some(Tier::Admin),
            _ => None,
        }
    }

    /// Resolves a profile's tier from its stored columns.
    ///
    /// `subscription_tier` wins over `role`. Anything that does not name a
    /// known tier resolves to `Registered`, the most restrictive bundle.
    pub fn resolve(subscription_tier: Option<&str>, role: Option<&str>) -> Tier {
        let non_empty = |s: &&str| !s.trim().is_empty();
        let subscription_tier = subscription_tier.filter(non_empty);
        let role = role.filter(non_empty);

        if let (Some(sub), Some(r)) = (
            subscription_tier.and_then(Tier::parse),
            role.and_then(Tier::parse),
        ) {
            if sub != r {
                tracing::warn!(
                    subscription_tier = sub.as_str(),
                    role = r.as_str(),
                    "Tier mismatch between subscription_tier and role"
                );
            }
        }

        match subscription_tier.or(role) {
            None => Tier::Registered,
            Some(raw) => Tier::parse(raw).unwrap_or_else(|| {
                tracing::warn!(tier = raw, "Unknown tier, falling back to registered");
                Tier::Registered
            }),
        }
    }

    pub fn recommended_upgrade(self) -> Option<Tier> {
        match self {
            Tier::Registered => Some(Tier::Silver),
            Tier::Silver => Some(Tier::Gold),
            Tier::Gold => Some(Tier::Platinum),
            Tier::Platinum | Tier::Moderator | Tier::Admin => None,
        }
    }

    pub fn entitlement(self) -> &'static Entitlement {
        match self {
            Tier::Registered => &REGISTERED,
            Tier::Silver => &SILVER,
            Tier::Gold => &GOLD,
            Tier::Platinum => &PLATINUM,
            Tier::Moderator => &MODERATOR,
            Tier::Admin => &ADMIN,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numeric allowance. `Unlimited` replaces the legacy 999 cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Capped(u32),
    Unlimited,
}

impl Limit {
    pub const LEGACY_UNLIMITED: i64 = 999;

    /// Reads a limit stored in the legacy encoding where 999 meant "no cap".
    pub fn from_legacy(value: i64) -> Limit {
        if value >= Self::LEGACY_UNLIMITED {
            Limit::Unlimited
        } else {
            Limit::Capped(value.max(0) as u32)
        }
    }

    pub fn permits(self, used: u32) -> bool {
        match self {
            Limit::Unlimited => true,
            Limit::Capped(cap) => used < cap,
        }
    }

    pub fn remaining(self, used: u32) -> Remaining {
        match self {
            Limit::Unlimited => Remaining::Unlimited,
            Limit::Capped(cap) => Remaining::Count(cap.saturating_sub(used)),
        }
    }

    /// True when `self` allows strictly more than `other`.
    pub fn exceeds(self, other: Limit) -> bool {
        match (self, other) {
            (Limit::Unlimited, Limit::Unlimited) => false,
            (Limit::Unlimited, Limit::Capped(_)) => true,
            (Limit::Capped(_), Limit::Unlimited) => false,
            (Limit::Capped(a), Limit::Capped(b)) => a > b,
        }
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Limit::Capped(n) => serializer.serialize_u32(*n),
            Limit::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LimitVisitor;

        impl<'de> Visitor<'de> for LimitVisitor {
            type Value = Limit;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a non-negative integer or \"unlimited\"")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Limit, E> {
                Ok(Limit::from_legacy(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Limit, E> {
                Ok(Limit::from_legacy(i64::try_from(v).unwrap_or(i64::MAX)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Limit, E> {
                if v.eq_ignore_ascii_case("unlimited") {
                    Ok(Limit::Unlimited)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(LimitVisitor)
    }
}

/// What is left of an allowance today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Count(u32),
    Unlimited,
}

impl Serialize for Remaining {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Remaining::Count(n) => serializer.serialize_u32(*n),
            Remaining::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    SeeWhoLikesYou,
    AdvancedFilters,
    ReadReceipts,
    Rewind,
    VoiceCalls,
    VideoCalls,
    AdsDisabled,
    UnlimitedMessages,
    PriorityMessages,
    InvisibleBrowsing,
    LocationChange,
    VideoProfile,
    ProfileBoost,
    Passport,
    TopPicks,
    MultiLanguageChat,
    AdminPanel,
    UserManagement,
    ContentModeration,
    SystemSettings,
    Analytics,
}

impl Feature {
    pub const ALL: [Feature; 21] = [
        Feature::SeeWhoLikesYou,
        Feature::AdvancedFilters,
        Feature::ReadReceipts,
        Feature::Rewind,
        Feature::VoiceCalls,
        Feature::VideoCalls,
        Feature::AdsDisabled,
        Feature::UnlimitedMessages,
        Feature::PriorityMessages,
        Feature::InvisibleBrowsing,
        Feature::LocationChange,
        Feature::VideoProfile,
        Feature::ProfileBoost,
        Feature::Passport,
        Feature::TopPicks,
        Feature::MultiLanguageChat,
        Feature::AdminPanel,
        Feature::UserManagement,
        Feature::ContentModeration,
        Feature::SystemSettings,
        Feature::Analytics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Feature::SeeWhoLikesYou => "seeWhoLikesYou",
            Feature::AdvancedFilters => "advancedFilters",
            Feature::ReadReceipts => "readReceipts",
            Feature::Rewind => "rewind",
            Feature::VoiceCalls => "voiceCalls",
            Feature::VideoCalls => "videoCalls",
            Feature::AdsDisabled => "adsDisabled",
            Feature::UnlimitedMessages => "unlimitedMessages",
            Feature::PriorityMessages => "priorityMessages",
            Feature::InvisibleBrowsing => "invisibleBrowsing",
            Feature::LocationChange => "locationChange",
            Feature::VideoProfile => "videoProfile",
            Feature::ProfileBoost => "profileBoost",
            Feature::Passport => "passport",
            Feature::TopPicks => "topPicks",
            Feature::MultiLanguageChat => "multiLanguageChat",
            Feature::AdminPanel => "adminPanel",
            Feature::UserManagement => "userManagement",
            Feature::ContentModeration => "contentModeration",
            Feature::SystemSettings => "systemSettings",
            Feature::Analytics => "analytics",
        }
    }

    /// Lowest tier whose rank unlocks the feature.
    pub fn required_tier(self) -> Tier {
        match self {
            Feature::SeeWhoLikesYou
            | Feature::AdvancedFilters
            | Feature::ReadReceipts
            | Feature::Rewind
            | Feature::VoiceCalls
            | Feature::VideoCalls
            | Feature::AdsDisabled => Tier::Silver,
            Feature::UnlimitedMessages
            | Feature::PriorityMessages
            | Feature::InvisibleBrowsing
            | Feature::LocationChange
            | Feature::VideoProfile
            | Feature::ProfileBoost
            | Feature::Passport
            | Feature::TopPicks => Tier::Gold,
            Feature::MultiLanguageChat => Tier::Platinum,
            Feature::AdminPanel
            | Feature::UserManagement
            | Feature::ContentModeration
            | Feature::SystemSettings
            | Feature::Analytics => Tier::Admin,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| *c != '_' && *c != '-').collect();
        Feature::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("Unknown feature '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub daily_likes: Limit,
    pub daily_super_likes: Limit,
    pub monthly_boosts: Limit,
    pub boost_duration_minutes: u32,
    pub max_photos: u32,
    pub features: &'static [Feature],
}

impl Entitlement {
    pub fn limit(&self, action: Action) -> Limit {
        match action {
            Action::Like => self.daily_likes,
            Action::SuperLike => self.daily_super_likes,
            Action::Boost => self.monthly_boosts,
        }
    }

    pub fn has(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
}

const SILVER_FEATURES: &[Feature] = &[
    Feature::UnlimitedMessages,
    Feature::ReadReceipts,
    Feature::AdvancedFilters,
    Feature::SeeWhoLikesYou,
    Feature::Rewind,
    Feature::AdsDisabled,
    Feature::VoiceCalls,
    Feature::VideoCalls,
];

const GOLD_FEATURES: &[Feature] = &[
    Feature::UnlimitedMessages,
    Feature::ReadReceipts,
    Feature::AdvancedFilters,
    Feature::SeeWhoLikesYou,
    Feature::Rewind,
    Feature::AdsDisabled,
    Feature::VoiceCalls,
    Feature::VideoCalls,
    Feature::PriorityMessages,
    Feature::LocationChange,
    Feature::InvisibleBrowsing,
    Feature::VideoProfile,
    Feature::ProfileBoost,
    Feature::Passport,
    Feature::TopPicks,
];

const PLATINUM_FEATURES: &[Feature] = &[
    Feature::UnlimitedMessages,
    Feature::ReadReceipts,
    Feature::AdvancedFilters,
    Feature::SeeWhoLikesYou,
    Feature::Rewind,
    Feature::AdsDisabled,
    Feature::VoiceCalls,
    Feature::VideoCalls,
    Feature::PriorityMessages,
    Feature::LocationChange,
    Feature::InvisibleBrowsing,
    Feature::VideoProfile,
    Feature::ProfileBoost,
    Feature::Passport,
    Feature::TopPicks,
    Feature::MultiLanguageChat,
];

const MODERATOR_FEATURES: &[Feature] = &[
    Feature::UnlimitedMessages,
    Feature::ReadReceipts,
    Feature::AdvancedFilters,
    Feature::SeeWhoLikesYou,
    Feature::Rewind,
    Feature::AdsDisabled,
    Feature::VoiceCalls,
    Feature::VideoCalls,
    Feature::PriorityMessages,
    Feature::LocationChange,
    Feature::InvisibleBrowsing,
    Feature::VideoProfile,
    Feature::ProfileBoost,
    Feature::Passport,
    Feature::TopPicks,
    Feature::MultiLanguageChat,
    Feature::ContentModeration,
    Feature::Analytics,
];

static REGISTERED: Entitlement = Entitlement {
    daily_likes: Limit::Capped(10),
    daily_super_likes: Limit::Capped(0),
    monthly_boosts: Limit::Capped(0),
    boost_duration_minutes: 0,
    max_photos: 6,
    features: &[],
};

static SILVER: Entitlement = Entitlement {
    daily_likes: Limit::Capped(50),
    daily_super_likes: Limit::Capped(5),
    monthly_boosts: Limit::Capped(1),
    boost_duration_minutes: 30,
    max_photos: 10,
    features: SILVER_FEATURES,
};

static GOLD: Entitlement = Entitlement {
    daily_likes: Limit::Capped(100),
    daily_super_likes: Limit::Capped(10),
    monthly_boosts: Limit::Capped(3),
    boost_duration_minutes: 60,
    max_photos: 10,
    features: GOLD_FEATURES,
};

static PLATINUM: Entitlement = Entitlement {
    daily_likes: Limit::Unlimited,
    daily_super_likes: Limit::Capped(25),
    monthly_boosts: Limit::Capped(10),
    boost_duration_minutes: 120,
    max_photos: 15,
    features: PLATINUM_FEATURES,
};

static MODERATOR: Entitlement = Entitlement {
    daily_likes: Limit::Unlimited,
    daily_super_likes: Limit::Unlimited,
    monthly_boosts: Limit::Unlimited,
    boost_duration_minutes: 240,
    max_photos: 25,
    features: MODERATOR_FEATURES,
};

static ADMIN: Entitlement = Entitlement {
    daily_likes: Limit::Unlimited,
    daily_super_likes: Limit::Unlimited,
    monthly_boosts: Limit::Unlimited,
    boost_duration_minutes: 240,
    max_photos: 25,
    features: &Feature::ALL,
};
