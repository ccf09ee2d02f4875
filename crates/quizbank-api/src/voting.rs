use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use quizbank_types::api::VoteCountResponse;

use crate::error::{ApiError, ApiResult};
use crate::middleware::MaybeUser;
use crate::state::AppState;

/// Cast or flip a vote. One row per (question, user) is a store-level
/// constraint, so re-voting flips in place instead of duplicating.
async fn cast(
    state: AppState,
    user: MaybeUser,
    question_id: Uuid,
    upvote: bool,
) -> ApiResult<Json<VoteCountResponse>> {
    let user = user.require()?;

    let question_id = question_id.to_string();
    if state.db.get_question(&question_id)?.is_none() {
        return Err(ApiError::not_found());
    }
    state.db.cast_vote(&question_id, &user.id.to_string(), upvote)?;

    Ok(Json(VoteCountResponse {
        upvote_count: state.db.count_upvotes(&question_id)?,
        downvote_count: state.db.count_downvotes(&question_id)?,
    }))
}

pub async fn upvote(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path(question_id): Path<Uuid>,
) -> ApiResult<Json<VoteCountResponse>> {
    cast(state, user, question_id, true).await
}

pub async fn downvote(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path(question_id): Path<Uuid>,
) -> ApiResult<Json<VoteCountResponse>> {
    cast(state, user, question_id, false).await
}

/// Withdraw the requester's vote. Always a 204: unvoting a question never
/// voted on, or one that does not even exist, is a no-op success.
pub async fn unvote(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path(question_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let user = user.require()?;

    state.db.remove_vote(&question_id.to_string(), &user.id.to_string())?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_counts(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
) -> ApiResult<Json<VoteCountResponse>> {
    let question_id = question_id.to_string();
    if state.db.get_question(&question_id)?.is_none() {
        return Err(ApiError::not_found());
    }
    Ok(Json(VoteCountResponse {
        upvote_count: state.db.count_upvotes(&question_id)?,
        downvote_count: state.db.count_downvotes(&question_id)?,
    }))
}
