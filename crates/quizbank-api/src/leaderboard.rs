use axum::{Json, extract::State};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;
use crate::util;

/// User ids ranked by how many of their questions have been verified.
pub async fn by_verified(State(state): State<AppState>) -> ApiResult<Json<Vec<Uuid>>> {
    let db = state.clone();
    let ids = tokio::task::spawn_blocking(move || db.db.users_by_verified_count())
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;
    Ok(Json(ids.iter().map(|id| util::parse_uuid(id)).collect()))
}

/// User ids ranked by aggregate net votes across their verified questions.
pub async fn by_total_upvotes(State(state): State<AppState>) -> ApiResult<Json<Vec<Uuid>>> {
    let db = state.clone();
    let ids = tokio::task::spawn_blocking(move || db.db.users_by_total_net_votes())
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;
    Ok(Json(ids.iter().map(|id| util::parse_uuid(id)).collect()))
}
