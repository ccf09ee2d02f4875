use std::collections::HashSet;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use quizbank_db::models::AttemptRow;
use quizbank_policy::score_attempt;
use quizbank_types::api::{
    AttemptResponse, CreateAttemptRequest, ScoredAnswer, SubmitAnswerRequest,
};

use crate::error::{ApiError, ApiResult};
use crate::middleware::MaybeUser;
use crate::state::{AppState, AppStateInner};
use crate::util;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub quiz_id: Option<Uuid>,
}

/// Score and assemble an attempt. Correctness is derived on every read by
/// checking each recorded answer against the question's current correct key.
fn attempt_response(state: &AppStateInner, row: AttemptRow) -> ApiResult<AttemptResponse> {
    let answers = state.db.get_attempt_answers(&row.id)?;
    let quiz_len = state.db.quiz_question_ids(&row.quiz_id)?.len();

    let mut scored = Vec::with_capacity(answers.len());
    let mut checks = Vec::with_capacity(answers.len());
    for answer in answers {
        let correct = state.db.correct_answer_key(&answer.question_id)?
            == Some(answer.answer_key);
        checks.push(correct);
        scored.push(ScoredAnswer {
            question: util::parse_uuid(&answer.question_id),
            answer_key: answer.answer_key,
            correct,
        });
    }
    let score = score_attempt(&checks, quiz_len);

    Ok(AttemptResponse {
        id: util::parse_uuid(&row.id),
        user: util::parse_uuid(&row.user_id),
        quiz: util::parse_uuid(&row.quiz_id),
        answers: scored,
        num_correct: score.num_correct,
        num_incorrect: score.num_incorrect,
        num_unanswered: score.num_unanswered,
        created_at: util::parse_sqlite_ts(&row.created_at),
        updated_at: util::parse_sqlite_ts(&row.updated_at),
    })
}

/// A valid submission targets a question inside the quiz and uses one of the
/// question's own answer keys.
fn validate_submission(
    state: &AppStateInner,
    quiz_id: &str,
    question_id: &str,
    answer_key: i64,
) -> ApiResult<()> {
    if !state.db.quiz_contains_question(quiz_id, question_id)? {
        return Err(ApiError::bad_request("Question is not part of the quiz"));
    }
    if !state.db.answer_keys(question_id)?.contains(&answer_key) {
        return Err(ApiError::bad_request("Invalid answer key"));
    }
    Ok(())
}

/// The requester's own attempt ids, newest first, optionally narrowed to one
/// quiz.
pub async fn list_attempts(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Uuid>>> {
    let user = user.require()?.clone();

    let db = state.clone();
    let quiz = query.quiz_id.map(|q| q.to_string());
    let ids = tokio::task::spawn_blocking(move || {
        db.db.list_attempt_ids(&user.id.to_string(), quiz.as_deref())
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(Json(ids.iter().map(|id| util::parse_uuid(id)).collect()))
}

pub async fn get_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AttemptResponse>> {
    let user = user.require()?;

    let row = state
        .db
        .get_attempt(&id.to_string(), &user.id.to_string())?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(attempt_response(&state, row)?))
}

/// Attempts only ever target public quizzes, even for admins; the quiz must
/// exist and be public or the create is rejected outright.
pub async fn create_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Json(req): Json<CreateAttemptRequest>,
) -> ApiResult<Json<AttemptResponse>> {
    let user = user.require()?.clone();

    let quiz_id = req.quiz.to_string();
    let quiz = state.db.get_quiz_scoped(&quiz_id, true)?.ok_or_else(ApiError::not_found)?;

    let mut seen = HashSet::new();
    for answer in &req.answers {
        if !seen.insert(answer.question) {
            return Err(ApiError::bad_request("Duplicate question in answers"));
        }
        validate_submission(&state, &quiz.id, &answer.question.to_string(), answer.answer_key)?;
    }

    let id = Uuid::new_v4().to_string();
    let answers: Vec<(String, i64)> =
        req.answers.iter().map(|a| (a.question.to_string(), a.answer_key)).collect();
    state.db.insert_attempt(&id, &user.id.to_string(), &quiz.id, &answers)?;

    let row = state
        .db
        .get_attempt(&id, &user.id.to_string())?
        .ok_or_else(|| anyhow::anyhow!("attempt {} vanished after insert", id))?;
    Ok(Json(attempt_response(&state, row)?))
}

pub async fn delete_attempt(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let user = user.require()?;

    if !state.db.delete_attempt(&id.to_string(), &user.id.to_string())? {
        return Err(ApiError::not_found());
    }
    Ok(StatusCode::OK)
}

/// Record or replace one answer. 201 when the question had no answer yet,
/// 204 when an existing answer was overwritten.
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path((id, question_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<SubmitAnswerRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = user.require()?;

    let row = state
        .db
        .get_attempt(&id.to_string(), &user.id.to_string())?
        .ok_or_else(ApiError::not_found)?;
    let question_id = question_id.to_string();
    validate_submission(&state, &row.quiz_id, &question_id, req.answer_key)?;

    if state.db.upsert_attempt_answer(&row.id, &question_id, req.answer_key)? {
        Ok(StatusCode::CREATED)
    } else {
        Ok(StatusCode::NO_CONTENT)
    }
}

/// Remove one answer. 200 when removed, 204 when the question had no answer.
pub async fn remove_answer(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path((id, question_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    let user = user.require()?;

    let row = state
        .db
        .get_attempt(&id.to_string(), &user.id.to_string())?
        .ok_or_else(ApiError::not_found)?;

    if state.db.remove_attempt_answer(&row.id, &question_id.to_string())? {
        Ok(StatusCode::OK)
    } else {
        Ok(StatusCode::NO_CONTENT)
    }
}
