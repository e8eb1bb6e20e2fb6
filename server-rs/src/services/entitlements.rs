use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Action, Entitlement, Feature, Remaining, Tier, UsagePatch, UsageRecord};
use crate::services::clock::Clock;
use crate::services::gate::{self, FeatureAccess, GateDecision};
use crate::store::UsageStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalView {
    pub tier: Tier,
    pub usage: UsageRecord,
}

impl LocalView {
    pub fn decision(&self, action: Action) -> GateDecision {
        gate::evaluate_for(self.tier, action, &self.usage)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsSummary {
    pub tier: Tier,
    pub entitlement: &'static Entitlement,
    pub likes: GateDecision,
    pub super_likes: GateDecision,
    pub boosts: GateDecision,
    pub last_reset: Option<DateTime<Utc>>,
    pub recommended_upgrade: Option<Tier>,
}

#[derive(Debug)]
pub struct ActionOutcome<T> {
    pub value: T,
    pub decision: GateDecision,
}

struct InFlight {
    view: LocalView,
    pending: u32,
}

// Views exist only while a `perform` is running for the user. Two sessions
// of the same user are not coordinated: both can read the last remaining
// unit and both can spend it.
pub struct EntitlementService {
    store: Arc<dyn UsageStore>,
    clock: Arc<dyn Clock>,
    views: Mutex<HashMap<Uuid, InFlight>>,
}

impl EntitlementService {
    pub fn new(store: Arc<dyn UsageStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            views: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn UsageStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub async fn can_perform(&self, user_id: Uuid, action: Action) -> AppResult<GateDecision> {
        let view = self.refresh(user_id).await?;
        let decision = view.decision(action);
        tracing::debug!(
            %user_id,
            action = action.as_str(),
            allowed = decision.allowed,
            used = decision.used,
            "Gate decision"
        );
        Ok(decision)
    }

    pub async fn get_remaining(&self, user_id: Uuid, action: Action) -> AppResult<Remaining> {
        Ok(self.can_perform(user_id, action).await?.remaining)
    }

    /// Counts one use of `action` that has already succeeded remotely.
    pub async fn record_usage(&self, user_id: Uuid, action: Action) -> AppResult<UsageRecord> {
        let mut view = self.refresh(user_id).await?;
        view.decision(action).into_result()?;

        let next = view.usage.used(action) + 1;
        self.write(user_id, &UsagePatch::counter(action, next)).await?;

        *view.usage.used_mut(action) = next;
        Ok(view.usage)
    }

    /// Runs `op` behind the gate and counts it once it has succeeded.
    ///
    /// The local view is decremented before `op` runs and restored if
    /// either `op` or the counter write fails, or if the call is dropped.
    pub async fn perform<T, F, Fut>(
        &self,
        user_id: Uuid,
        action: Action,
        op: F,
    ) -> AppResult<ActionOutcome<T>>
    where
        F: FnOnce(Tier) -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let view = self.refresh(user_id).await?;
        view.decision(action).into_result()?;

        let before = view.usage.used(action);
        let pending = PendingUse::begin(self, &view, action);

        let value = match op(view.tier).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(%user_id, action = action.as_str(), "Gated action failed: {e}");
                drop(pending);
                return Err(e);
            }
        };

        if let Err(e) = self.write(user_id, &UsagePatch::counter(action, before + 1)).await {
            tracing::warn!(
                %user_id,
                action = action.as_str(),
                "Usage write failed, rolling back local quota: {e}"
            );
            drop(pending);
            return Err(e);
        }

        let decision = match pending.commit() {
            Some(view) => view.decision(action),
            None => {
                let mut usage = view.usage.clone();
                *usage.used_mut(action) = before + 1;
                gate::evaluate_for(view.tier, action, &usage)
            }
        };
        Ok(ActionOutcome { value, decision })
    }

    pub async fn summary(&self, user_id: Uuid) -> AppResult<LimitsSummary> {
        let view = self.refresh(user_id).await?;
        Ok(LimitsSummary {
            tier: view.tier,
            entitlement: view.tier.entitlement(),
            likes: view.decision(Action::Like),
            super_likes: view.decision(Action::SuperLike),
            boosts: view.decision(Action::Boost),
            last_reset: view.usage.last_reset,
            recommended_upgrade: view.tier.recommended_upgrade(),
        })
    }

    pub async fn feature_access(&self, user_id: Uuid, feature: Feature) -> AppResult<FeatureAccess> {
        let view = self.refresh(user_id).await?;
        Ok(gate::check_feature(view.tier, feature))
    }

    /// Optimistic state of an action still in flight for `user_id`.
    pub fn local_view(&self, user_id: Uuid) -> Option<LocalView> {
        self.lock_views().get(&user_id).map(|entry| entry.view.clone())
    }

    async fn refresh(&self, user_id: Uuid) -> AppResult<LocalView> {
        let row = self
            .store
            .fetch_usage(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;
        let tier = row.tier();
        let mut usage = row.usage();

        if usage.is_stale(self.clock.today()) {
            tracing::debug!(%user_id, last_reset = ?usage.last_reset, "Resetting daily counters");
            let patch = UsagePatch::reset(self.clock.now());
            self.write(user_id, &patch).await?;
            usage.apply(&patch);
        }

        Ok(LocalView { tier, usage })
    }

    async fn write(&self, user_id: Uuid, patch: &UsagePatch) -> AppResult<()> {
        self.store
            .update_usage(user_id, patch)
            .await
            .map_err(|e| match e {
                AppError::Database(err) => AppError::RemoteWriteFailure(err.to_string()),
                other => other,
            })
    }

    fn lock_views(&self) -> MutexGuard<'_, HashMap<Uuid, InFlight>> {
        self.views.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One optimistic use held in the local view. Dropping it without
/// `commit` gives the unit back.
struct PendingUse<'a> {
    service: &'a EntitlementService,
    user_id: Uuid,
    action: Action,
    settled: bool,
}

impl<'a> PendingUse<'a> {
    fn begin(service: &'a EntitlementService, view: &LocalView, action: Action) -> Self {
        let user_id = view.usage.user_id;
        let mut views = service.lock_views();
        let entry = views.entry(user_id).or_insert_with(|| InFlight {
            view: view.clone(),
            pending: 0,
        });
        entry.pending += 1;
        *entry.view.usage.used_mut(action) += 1;
        Self {
            service,
            user_id,
            action,
            settled: false,
        }
    }

    fn commit(mut self) -> Option<LocalView> {
        self.release(false)
    }

    fn release(&mut self, rollback: bool) -> Option<LocalView> {
        self.settled = true;
        let mut views = self.service.lock_views();
        let entry = views.get_mut(&self.user_id)?;
        if rollback {
            let used = entry.view.usage.used_mut(self.action);
            *used = used.saturating_sub(1);
        }
        entry.pending = entry.pending.saturating_sub(1);
        let view = entry.view.clone();
        if entry.pending == 0 {
            views.remove(&self.user_id);
        }
        Some(view)
    }
}

impl Drop for PendingUse<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.release(true);
        }
    }
}
