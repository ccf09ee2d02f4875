use std::collections::HashSet;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use quizbank_db::models::{AnswerRow, QuestionRow};
use quizbank_policy::{QuestionCandidate, question_scope, rank_questions};
use quizbank_types::api::{
    AnswerBody, CreateQuestionRequest, MutateRequest, MutateResponse, QuestionResponse,
    UpdateQuestionRequest, VerifyRequest,
};
use quizbank_types::models::Difficulty;

use crate::error::{ApiError, ApiResult};
use crate::generate::GeneratorInput;
use crate::middleware::MaybeUser;
use crate::state::{AppState, AppStateInner};
use crate::util;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub subject: Option<Uuid>,
    pub difficulty: Option<String>,
    pub uploader: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub subject: Option<Uuid>,
    pub difficulty: Option<String>,
    pub uploader: Option<Uuid>,
}

fn parse_difficulty(s: &str) -> ApiResult<Difficulty> {
    s.parse::<Difficulty>().map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Answer keys must be unique within the question and the correct key must
/// reference one of them. Checked strictly before any write.
pub(crate) fn validate_answers(answers: &[AnswerBody], correct_key: i64) -> ApiResult<()> {
    let mut keys = HashSet::new();
    for a in answers {
        if !keys.insert(a.key) {
            return Err(ApiError::bad_request("Answers keys must be unique"));
        }
    }
    if !keys.contains(&correct_key) {
        return Err(ApiError::bad_request("Correct answer key must be in answers array"));
    }
    Ok(())
}

fn validate_mime(mime_type: &str) -> ApiResult<()> {
    mime_type
        .parse::<mime::Mime>()
        .map(|_| ())
        .map_err(|_| ApiError::bad_request("Invalid descriptionMIME, must be a valid MIME type"))
}

/// Assemble the full wire representation: populated subject, answers, vote
/// counts and the viewer's own vote state.
fn question_response(
    state: &AppStateInner,
    row: QuestionRow,
    viewer: Option<Uuid>,
) -> ApiResult<QuestionResponse> {
    let subject = state
        .db
        .get_subject(&row.subject_id)?
        .ok_or_else(|| anyhow::anyhow!("question {} references missing subject {}", row.id, row.subject_id))?;
    let answers = state.db.get_answers(&row.id)?;
    let upvote_count = state.db.count_upvotes(&row.id)?;
    let downvote_count = state.db.count_downvotes(&row.id)?;
    let vote = match viewer {
        Some(viewer) => state.db.get_vote(&row.id, &viewer.to_string())?,
        None => None,
    };
    let difficulty = row
        .difficulty
        .parse::<Difficulty>()
        .map_err(|e| anyhow::anyhow!("stored difficulty unreadable: {}", e))?;

    Ok(QuestionResponse {
        id: util::parse_uuid(&row.id),
        question: row.question,
        description: row.description,
        description_mime: row.description_mime,
        subject: quizbank_types::api::SubjectResponse {
            id: util::parse_uuid(&subject.id),
            name: subject.name,
            description: subject.description,
        },
        answers: answers.into_iter().map(|a| AnswerBody { key: a.key, text: a.text }).collect(),
        correct_answer_key: row.correct_answer_key,
        correct_answer_explanation: row.correct_answer_explanation,
        uploader: util::parse_uuid(&row.uploader_id),
        difficulty,
        verified: row.verified,
        generated_from: row.generated_from.as_deref().map(util::parse_uuid),
        upvote_count,
        downvote_count,
        upvoted: vote == Some(true),
        downvoted: vote == Some(false),
    })
}

/// Visible question ids, sorted by net votes descending.
pub async fn list_questions(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Uuid>>> {
    let difficulty = query.difficulty.as_deref().map(parse_difficulty).transpose()?;
    let scope = question_scope(&user.requester(), query.uploader);

    let db = state.clone();
    let subject = query.subject.map(|s| s.to_string());
    let ids = tokio::task::spawn_blocking(move || {
        db.db.list_question_ids(
            &scope,
            subject.as_deref(),
            difficulty.map(|d| d.as_str()),
        )
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    Ok(Json(ids.iter().map(|id| util::parse_uuid(id)).collect()))
}

/// Ranked text search: the text index picks candidates within the visibility
/// scope, then edit distance to the question text, distance to the
/// description and net votes order them.
pub async fn search_questions(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Uuid>>> {
    let q = query.q.ok_or_else(|| ApiError::bad_request("Query required"))?;
    let difficulty = query.difficulty.as_deref().map(parse_difficulty).transpose()?;
    let scope = question_scope(&user.requester(), query.uploader);

    let Some(expr) = quizbank_db::fts::match_expr(&q) else {
        return Ok(Json(vec![]));
    };

    let db = state.clone();
    let subject = query.subject.map(|s| s.to_string());
    let hits = tokio::task::spawn_blocking(move || {
        db.db.search_questions(
            &expr,
            &scope,
            subject.as_deref(),
            difficulty.map(|d| d.as_str()),
        )
    })
    .await
    .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    let candidates = hits
        .into_iter()
        .map(|hit| QuestionCandidate {
            id: hit.id,
            question: hit.question,
            description: hit.description,
            net_votes: hit.net_votes,
        })
        .collect();

    let ranked = rank_questions(&q, candidates);
    Ok(Json(ranked.iter().map(|id| util::parse_uuid(id)).collect()))
}

/// The difficulty levels, for frontend dropdowns.
pub async fn difficulty_levels() -> Json<Vec<Difficulty>> {
    Json(Difficulty::ALL.to_vec())
}

pub async fn get_question(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<QuestionResponse>> {
    // Same predicate as listings, collapsed to a point check: a hidden
    // question is a missing question.
    let scope = question_scope(&user.requester(), None);
    let row = state
        .db
        .get_question_scoped(&id.to_string(), &scope)?
        .ok_or_else(ApiError::not_found)?;

    let viewer = user.0.as_ref().map(|u| u.id);
    Ok(Json(question_response(&state, row, viewer)?))
}

pub async fn create_question(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Json(req): Json<CreateQuestionRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = user.require()?.clone();

    if req.question.is_empty() {
        return Err(ApiError::bad_request(
            "Question, subject, answers, correctAnswerKey and difficulty required",
        ));
    }
    let description_mime = req.description_mime.unwrap_or_else(|| "text/plain".to_string());
    validate_mime(&description_mime)?;
    let difficulty = parse_difficulty(&req.difficulty)?;
    if state.db.question_text_exists(&req.question)? {
        return Err(ApiError::Conflict("Question already exists".into()));
    }
    let subject = state
        .db
        .get_subject(&req.subject.to_string())?
        .ok_or_else(|| ApiError::NotFound("Subject does not exist".into()))?;
    validate_answers(&req.answers, req.correct_answer_key)?;

    let row = QuestionRow {
        id: Uuid::new_v4().to_string(),
        question: req.question,
        description: req.description.unwrap_or_default(),
        description_mime,
        subject_id: subject.id,
        correct_answer_key: req.correct_answer_key,
        correct_answer_explanation: req.correct_answer_explanation.unwrap_or_default(),
        uploader_id: user.id.to_string(),
        difficulty: difficulty.as_str().to_string(),
        verified: false,
        generated_from: None,
    };
    let answers: Vec<AnswerRow> =
        req.answers.into_iter().map(|a| AnswerRow { key: a.key, text: a.text }).collect();
    state.db.insert_question(&row, &answers)?;

    Ok((StatusCode::CREATED, Json(question_response(&state, row, Some(user.id))?)))
}

/// Partial update by the uploader. The question text itself is immutable;
/// the merged answers/correct key are re-validated as a whole.
pub async fn update_question(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateQuestionRequest>,
) -> ApiResult<Json<QuestionResponse>> {
    let user = user.require()?.clone();

    let mut row = state
        .db
        .get_question_owned(&id.to_string(), &user.id.to_string())?
        .ok_or_else(ApiError::not_found)?;

    if let Some(description) = req.description {
        row.description = description;
    }
    if let Some(description_mime) = req.description_mime {
        validate_mime(&description_mime)?;
        row.description_mime = description_mime;
    }
    if let Some(subject) = req.subject {
        let subject = state
            .db
            .get_subject(&subject.to_string())?
            .ok_or_else(|| ApiError::NotFound("Subject does not exist".into()))?;
        row.subject_id = subject.id;
    }
    if let Some(key) = req.correct_answer_key {
        row.correct_answer_key = key;
    }

    let answers: Vec<AnswerBody> = match req.answers {
        Some(answers) => answers,
        None => state
            .db
            .get_answers(&row.id)?
            .into_iter()
            .map(|a| AnswerBody { key: a.key, text: a.text })
            .collect(),
    };
    validate_answers(&answers, row.correct_answer_key)?;

    if let Some(explanation) = req.correct_answer_explanation {
        row.correct_answer_explanation = explanation;
    }
    if let Some(difficulty) = req.difficulty {
        row.difficulty = parse_difficulty(&difficulty)?.as_str().to_string();
    }

    let answer_rows: Vec<AnswerRow> =
        answers.into_iter().map(|a| AnswerRow { key: a.key, text: a.text }).collect();
    state.db.update_question(&row, &answer_rows)?;

    Ok(Json(question_response(&state, row, Some(user.id))?))
}

pub async fn delete_question(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let user = user.require()?;

    if !state.db.delete_question_owned(&id.to_string(), &user.id.to_string())? {
        return Err(ApiError::not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn verify_question(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<VerifyRequest>,
) -> ApiResult<Json<QuestionResponse>> {
    let admin = user.require_admin()?.clone();

    let id = id.to_string();
    if !state.db.set_question_verified(&id, req.verified)? {
        return Err(ApiError::not_found());
    }
    let row = state.db.get_question(&id)?.ok_or_else(ApiError::not_found)?;
    Ok(Json(question_response(&state, row, Some(admin.id))?))
}

/// Delegate to the generation collaborator for a variant of an existing
/// question. The draft is re-validated with the same rules as a hand-written
/// question; collaborator failures surface as a generic server error with
/// the underlying message attached, and are not retried.
pub async fn mutate_question(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Json(req): Json<MutateRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = user.require()?.clone();

    let original = state
        .db
        .get_question(&req.original_question_id.to_string())?
        .ok_or_else(|| ApiError::NotFound("Original question does not exist".into()))?;
    let original_answers = state.db.get_answers(&original.id)?;

    let input = GeneratorInput {
        subject_id: original.subject_id.clone(),
        difficulty: original.difficulty.clone(),
        question: original.question.clone(),
        description: original.description.clone(),
        answers: original_answers
            .into_iter()
            .map(|a| AnswerBody { key: a.key, text: a.text })
            .collect(),
        correct_answer_key: original.correct_answer_key,
        correct_answer_explanation: original.correct_answer_explanation.clone(),
    };

    let draft = state.generator.generate_variant(&input).await?;

    let difficulty = draft
        .difficulty
        .to_uppercase()
        .parse::<Difficulty>()
        .map_err(|e| anyhow::anyhow!("generator returned an invalid difficulty: {}", e))?;
    validate_answers(&draft.answers, draft.correct_answer_key)
        .map_err(|e| anyhow::anyhow!("generator returned inconsistent answers: {}", e))?;
    if state.db.question_text_exists(&draft.question)? {
        return Err(ApiError::Conflict("Question already exists".into()));
    }

    let row = QuestionRow {
        id: Uuid::new_v4().to_string(),
        question: draft.question,
        description: draft.description.unwrap_or_default(),
        description_mime: "text/plain".to_string(),
        // The variant keeps the original's subject regardless of what the
        // generator claims.
        subject_id: original.subject_id,
        correct_answer_key: draft.correct_answer_key,
        correct_answer_explanation: draft.correct_answer_explanation.unwrap_or_default(),
        uploader_id: user.id.to_string(),
        difficulty: difficulty.as_str().to_string(),
        verified: user.is_admin,
        generated_from: Some(original.id),
    };
    let answers: Vec<AnswerRow> =
        draft.answers.into_iter().map(|a| AnswerRow { key: a.key, text: a.text }).collect();
    state.db.insert_question(&row, &answers)?;

    let new_question_id = util::parse_uuid(&row.id);
    let question = question_response(&state, row, Some(user.id))?;
    Ok((StatusCode::CREATED, Json(MutateResponse { new_question_id, question })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(keys: &[i64]) -> Vec<AnswerBody> {
        keys.iter().map(|k| AnswerBody { key: *k, text: format!("answer {k}") }).collect()
    }

    #[test]
    fn answer_keys_must_be_unique() {
        let err = validate_answers(&answers(&[1, 2, 2]), 1).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn correct_key_must_be_a_member() {
        assert!(validate_answers(&answers(&[1, 2, 3]), 2).is_ok());
        let err = validate_answers(&answers(&[1, 2, 3]), 4).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn empty_answer_list_cannot_contain_the_key() {
        assert!(validate_answers(&[], 1).is_err());
    }

    #[test]
    fn mime_validation() {
        assert!(validate_mime("text/plain").is_ok());
        assert!(validate_mime("application/x-latex").is_ok());
        assert!(validate_mime("not a mime").is_err());
    }
}
