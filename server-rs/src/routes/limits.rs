use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::models::{Action, Feature};
use crate::services::entitlements::LimitsSummary;
use crate::services::gate::{FeatureAccess, GateDecision};
use crate::AppState;

fn parse_action(raw: &str) -> AppResult<Action> {
    raw.parse().map_err(AppError::BadRequest)
}

pub async fn summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<LimitsSummary>> {
    let summary = state.entitlements.summary(user.id).await?;
    Ok(Json(summary))
}

pub async fn check(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(action): Path<String>,
) -> AppResult<Json<GateDecision>> {
    let action = parse_action(&action)?;
    let decision = state.entitlements.can_perform(user.id, action).await?;
    Ok(Json(decision))
}

/// Called once the underlying like/super-like/boost write has succeeded.
pub async fn record(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(action): Path<String>,
) -> AppResult<Json<Value>> {
    let action = parse_action(&action)?;
    let usage = state.entitlements.record_usage(user.id, action).await?;
    let decision = state.entitlements.can_perform(user.id, action).await?;

    Ok(Json(json!({
        "usage": usage,
        "decision": decision,
    })))
}

pub async fn feature(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(feature): Path<String>,
) -> AppResult<Json<FeatureAccess>> {
    let feature: Feature = feature.parse().map_err(AppError::BadRequest)?;
    let access = state.entitlements.feature_access(user.id, feature).await?;
    Ok(Json(access))
}
