use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use quizbank_db::models::QuizRow;
use quizbank_policy::quiz_public_only;
use quizbank_types::api::{CreateQuizRequest, QuizResponse, UpdateQuizRequest};

use crate::error::{ApiError, ApiResult};
use crate::middleware::MaybeUser;
use crate::state::{AppState, AppStateInner};
use crate::util;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

fn quiz_response(state: &AppStateInner, row: QuizRow) -> ApiResult<QuizResponse> {
    let questions = state.db.quiz_question_ids(&row.id)?;
    Ok(QuizResponse {
        id: util::parse_uuid(&row.id),
        name: row.name,
        questions: questions.iter().map(|id| util::parse_uuid(id)).collect(),
        creator: util::parse_uuid(&row.creator_id),
        is_public: row.is_public,
    })
}

/// Every member must exist and be verified at the time of the write; one bad
/// id rejects the whole request before anything is stored.
fn validate_members(state: &AppStateInner, question_ids: &[String]) -> ApiResult<()> {
    for id in question_ids {
        match state.db.question_verified(id)? {
            Some(true) => {}
            Some(false) => {
                return Err(ApiError::bad_request("Quiz questions must be verified"));
            }
            None => return Err(ApiError::bad_request("Question does not exist")),
        }
    }
    Ok(())
}

/// Visible quiz ids in lexical name order.
pub async fn list_quizzes(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
) -> ApiResult<Json<Vec<Uuid>>> {
    let public_only = quiz_public_only(&user.requester());

    let db = state.clone();
    let ids = tokio::task::spawn_blocking(move || db.db.list_quiz_ids(public_only))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(Json(ids.iter().map(|id| util::parse_uuid(id)).collect()))
}

/// Name search in native text-relevance order. Quizzes get no edit-distance
/// re-ranking.
pub async fn search_quizzes(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Uuid>>> {
    let q = query.q.ok_or_else(|| ApiError::bad_request("Query required"))?;
    let public_only = quiz_public_only(&user.requester());

    let Some(expr) = quizbank_db::fts::match_expr(&q) else {
        return Ok(Json(vec![]));
    };

    let db = state.clone();
    let ids = tokio::task::spawn_blocking(move || db.db.search_quiz_ids(&expr, public_only))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(Json(ids.iter().map(|id| util::parse_uuid(id)).collect()))
}

pub async fn get_quiz(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<QuizResponse>> {
    let public_only = quiz_public_only(&user.requester());
    let row = state
        .db
        .get_quiz_scoped(&id.to_string(), public_only)?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(quiz_response(&state, row)?))
}

pub async fn create_quiz(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Json(req): Json<CreateQuizRequest>,
) -> ApiResult<impl IntoResponse> {
    let admin = user.require_admin()?.clone();

    if req.name.is_empty() {
        return Err(ApiError::bad_request("Name required"));
    }
    if state.db.quiz_name_exists(&req.name)? {
        return Err(ApiError::Conflict("Quiz already exists".into()));
    }
    let question_ids: Vec<String> = req.questions.iter().map(|q| q.to_string()).collect();
    validate_members(&state, &question_ids)?;

    let id = Uuid::new_v4().to_string();
    let is_public = req.is_public.unwrap_or(false);
    state.db.insert_quiz(&id, &req.name, &admin.id.to_string(), is_public, &question_ids)?;

    let row = QuizRow {
        id,
        name: req.name,
        creator_id: admin.id.to_string(),
        is_public,
    };
    Ok((StatusCode::CREATED, Json(quiz_response(&state, row)?)))
}

pub async fn update_quiz(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateQuizRequest>,
) -> ApiResult<Json<QuizResponse>> {
    user.require_admin()?;

    let id = id.to_string();
    let mut row = state.db.get_quiz(&id)?.ok_or_else(ApiError::not_found)?;

    let question_ids: Option<Vec<String>> =
        req.questions.map(|qs| qs.iter().map(|q| q.to_string()).collect());
    if let Some(ref qs) = question_ids {
        validate_members(&state, qs)?;
    }

    state.db.update_quiz(&id, question_ids.as_deref(), req.is_public)?;
    if let Some(is_public) = req.is_public {
        row.is_public = is_public;
    }
    Ok(Json(quiz_response(&state, row)?))
}

pub async fn delete_quiz(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;

    if !state.db.delete_quiz(&id.to_string())? {
        return Err(ApiError::not_found());
    }
    Ok(StatusCode::OK)
}

/// Append a question to the quiz. 201 when newly added, 204 when it was
/// already a member.
pub async fn add_question(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path((id, question_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;

    let id = id.to_string();
    if state.db.get_quiz(&id)?.is_none() {
        return Err(ApiError::not_found());
    }
    let question_id = question_id.to_string();
    validate_members(&state, std::slice::from_ref(&question_id))?;

    if state.db.add_quiz_question(&id, &question_id)? {
        Ok(StatusCode::CREATED)
    } else {
        Ok(StatusCode::NO_CONTENT)
    }
}

/// Remove a question from the quiz. 200 when removed, 204 when it was not a
/// member to begin with.
pub async fn remove_question(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path((id, question_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;

    let id = id.to_string();
    if state.db.get_quiz(&id)?.is_none() {
        return Err(ApiError::not_found());
    }

    if state.db.remove_quiz_question(&id, &question_id.to_string())? {
        Ok(StatusCode::OK)
    } else {
        Ok(StatusCode::NO_CONTENT)
    }
}
