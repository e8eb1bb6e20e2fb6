use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::models::ActivateBoostRequest;
use crate::services::boosts::BoostActivation;
use crate::AppState;

pub async fn activate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Option<Json<ActivateBoostRequest>>,
) -> AppResult<Json<BoostActivation>> {
    let boost_type = body
        .and_then(|Json(req)| req.boost_type)
        .unwrap_or(state.config.boosts.default_type);
    let activation = state.boosts.activate(user.id, boost_type).await?;
    Ok(Json(activation))
}

pub async fn active(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<Value>> {
    let boost = state.boosts.active(user.id).await?;
    let now = state.entitlements.clock().now();
    let remaining_minutes = boost.as_ref().map(|b| b.remaining_minutes(now));
    Ok(Json(json!({
        "boost": boost,
        "remainingMinutes": remaining_minutes,
    })))
}

pub async fn end(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<Value>> {
    let ended = state.boosts.end(user.id).await?;
    Ok(Json(json!({ "ended": ended })))
}
