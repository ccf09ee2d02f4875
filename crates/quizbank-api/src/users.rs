use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use quizbank_types::api::{SetAdminRequest, UserResponse};

use crate::error::{ApiError, ApiResult};
use crate::middleware::MaybeUser;
use crate::state::AppState;
use crate::util;

/// Public profile lookup. Never exposes the admin flag or password hash.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let row = state
        .db
        .get_user_by_id(&id.to_string())?
        .ok_or_else(ApiError::not_found)?;

    Ok(Json(UserResponse {
        id: util::parse_uuid(&row.id),
        name: row.name,
        email: row.email,
    }))
}

/// Admins grant or revoke the admin flag on another user.
pub async fn set_admin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<MaybeUser>,
    Json(req): Json<SetAdminRequest>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;

    if !state.db.set_user_admin(&id.to_string(), req.is_admin)? {
        return Err(ApiError::not_found());
    }
    Ok(StatusCode::OK)
}
