use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Action, BoostType, NewBoost, ProfileBoost, Remaining};
use crate::services::entitlements::EntitlementService;
use crate::store::BoostStore;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoostActivation {
    pub boost: ProfileBoost,
    pub remaining_boosts: Remaining,
    pub duration_minutes: u32,
}

pub struct BoostService {
    entitlements: Arc<EntitlementService>,
    store: Arc<dyn BoostStore>,
}

impl BoostService {
    pub fn new(entitlements: Arc<EntitlementService>, store: Arc<dyn BoostStore>) -> Self {
        Self {
            entitlements,
            store,
        }
    }

    pub async fn activate(&self, user_id: Uuid, boost_type: BoostType) -> AppResult<BoostActivation> {
        let now = self.entitlements.clock().now();
        let store = Arc::clone(&self.store);

        let outcome = self
            .entitlements
            .perform(user_id, Action::Boost, move |tier| async move {
                if let Some(active) = store.active_boost(user_id, now).await? {
                    return Err(AppError::Conflict(format!(
                        "A boost is already active for another {} minutes",
                        active.remaining_minutes(now)
                    )));
                }

                let duration_minutes = tier.entitlement().boost_duration_minutes;
                store.deactivate_boosts(user_id).await?;
                store
                    .insert_boost(&NewBoost {
                        user_id,
                        boost_type,
                        duration_minutes,
                        started_at: now,
                    })
                    .await
            })
            .await?;

        tracing::info!(
            %user_id,
            boost_id = %outcome.value.id,
            boost_type = boost_type.as_str(),
            "Boost activated"
        );

        Ok(BoostActivation {
            duration_minutes: outcome.value.duration_minutes.max(0) as u32,
            boost: outcome.value,
            remaining_boosts: outcome.decision.remaining,
        })
    }

    pub async fn active(&self, user_id: Uuid) -> AppResult<Option<ProfileBoost>> {
        let now = self.entitlements.clock().now();
        self.store.active_boost(user_id, now).await
    }

    /// Ends any running boost. Returns whether one was running.
    pub async fn end(&self, user_id: Uuid) -> AppResult<bool> {
        let ended = self.store.deactivate_boosts(user_id).await?;
        Ok(ended > 0)
    }
}
