use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Action, LikeResult, Match};
use crate::services::entitlements::EntitlementService;
use crate::store::LikeStore;

pub struct LikeService {
    entitlements: Arc<EntitlementService>,
    store: Arc<dyn LikeStore>,
}

impl LikeService {
    pub fn new(entitlements: Arc<EntitlementService>, store: Arc<dyn LikeStore>) -> Self {
        Self {
            entitlements,
            store,
        }
    }

    /// Likes (or super-likes) `target_id` and opens a match when the like is
    /// mutual. The daily counter is charged only once the swipe is stored.
    pub async fn like(&self, user_id: Uuid, target_id: Uuid, super_like: bool) -> AppResult<LikeResult> {
        if user_id == target_id {
            return Err(AppError::BadRequest("You cannot like yourself".into()));
        }

        let action = if super_like { Action::SuperLike } else { Action::Like };
        let store = Arc::clone(&self.store);

        let outcome = self
            .entitlements
            .perform(user_id, action, move |_| async move {
                if store.find_swipe(user_id, target_id).await?.is_some() {
                    return Err(AppError::Conflict("You have already swiped on this profile".into()));
                }
                store.insert_like(user_id, target_id, super_like).await
            })
            .await?;

        let swipe = outcome.value;
        let matched = self.match_if_mutual(user_id, target_id).await;

        tracing::info!(
            %user_id,
            %target_id,
            action = action.as_str(),
            is_match = matched.is_some(),
            "Like recorded"
        );

        Ok(LikeResult {
            swipe_id: swipe.id,
            super_like,
            is_match: matched.is_some(),
            match_id: matched.map(|m| m.id),
            remaining: outcome.decision.remaining,
        })
    }

    // The like itself has already been stored and counted, so a failure here
    // only costs the match.
    async fn match_if_mutual(&self, user_id: Uuid, target_id: Uuid) -> Option<Match> {
        let theirs = match self.store.find_swipe(target_id, user_id).await {
            Ok(swipe) => swipe,
            Err(e) => {
                tracing::warn!(%user_id, %target_id, "Match check failed: {e}");
                return None;
            }
        };
        if !theirs.is_some_and(|s| s.is_like()) {
            return None;
        }

        match self.store.insert_match(user_id, target_id).await {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::warn!(%user_id, %target_id, "Match creation failed: {e}");
                None
            }
        }
    }
}
