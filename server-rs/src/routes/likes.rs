use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::models::LikeResult;
use crate::AppState;

pub async fn like(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(target): Path<Uuid>,
) -> AppResult<Json<LikeResult>> {
    let result = state.likes.like(user.id, target, false).await?;
    Ok(Json(result))
}

pub async fn super_like(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(target): Path<Uuid>,
) -> AppResult<Json<LikeResult>> {
    let result = state.likes.like(user.id, target, true).await?;
    Ok(Json(result))
}
