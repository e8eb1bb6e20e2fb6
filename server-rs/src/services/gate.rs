use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::{Action, Entitlement, Feature, Limit, Remaining, Tier, UsageRecord, PURCHASABLE_TIERS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    QuotaExceeded,
    TierRequired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDecision {
    pub action: Action,
    pub allowed: bool,
    pub used: u32,
    pub limit: Limit,
    pub remaining: Remaining,
    pub reason: Option<DenialReason>,
    pub suggested_tier: Option<Tier>,
}

impl GateDecision {
    pub fn into_result(self) -> AppResult<GateDecision> {
        if self.allowed {
            Ok(self)
        } else {
            Err(AppError::QuotaExceeded {
                action: self.action,
                limit: self.limit,
                suggested_tier: self.suggested_tier,
            })
        }
    }
}

/// Decides whether one more `action` fits in `entitlement` given `usage`.
pub fn evaluate(action: Action, entitlement: &Entitlement, usage: &UsageRecord) -> GateDecision {
    let limit = entitlement.limit(action);
    let used = usage.used(action);
    let allowed = limit.permits(used);

    GateDecision {
        action,
        allowed,
        used,
        limit,
        remaining: limit.remaining(used),
        reason: (!allowed).then_some(DenialReason::QuotaExceeded),
        suggested_tier: None,
    }
}

/// Same as [`evaluate`], plus an upgrade suggestion when denied.
pub fn evaluate_for(tier: Tier, action: Action, usage: &UsageRecord) -> GateDecision {
    let mut decision = evaluate(action, tier.entitlement(), usage);
    if !decision.allowed {
        decision.suggested_tier = suggest_upgrade(tier, action);
    }
    decision
}

/// Cheapest purchasable tier above `tier` that allows more of `action`.
pub fn suggest_upgrade(tier: Tier, action: Action) -> Option<Tier> {
    let current = tier.entitlement().limit(action);
    PURCHASABLE_TIERS
        .into_iter()
        .filter(|t| t.rank() > tier.rank())
        .find(|t| t.entitlement().limit(action).exceeds(current))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAccess {
    pub feature: Feature,
    pub allowed: bool,
    pub required_tier: Tier,
    pub reason: Option<DenialReason>,
}

impl FeatureAccess {
    pub fn into_result(self) -> AppResult<FeatureAccess> {
        if self.allowed {
            Ok(self)
        } else {
            Err(AppError::FeatureLocked {
                feature: self.feature,
                required_tier: self.required_tier,
            })
        }
    }
}

pub fn check_feature(tier: Tier, feature: Feature) -> FeatureAccess {
    let required_tier = feature.required_tier();
    let allowed = tier.entitlement().has(feature) || tier.rank() >= required_tier.rank();

    FeatureAccess {
        feature,
        allowed,
        required_tier,
        reason: (!allowed).then_some(DenialReason::TierRequired),
    }
}
