use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use quizbank_db::models::SubjectRow;
use quizbank_policy::{SubjectCandidate, rank_subjects};
use quizbank_types::api::{CreateSubjectRequest, SubjectResponse, UpdateSubjectRequest};

use crate::error::{ApiError, ApiResult};
use crate::middleware::MaybeUser;
use crate::state::AppState;
use crate::util;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

fn subject_response(row: SubjectRow) -> SubjectResponse {
    SubjectResponse {
        id: util::parse_uuid(&row.id),
        name: row.name,
        description: row.description,
    }
}

/// Full subject objects, not just ids — subjects are small and the frontend
/// always wants all of them.
pub async fn list_subjects(State(state): State<AppState>) -> ApiResult<Json<Vec<SubjectResponse>>> {
    let rows = state.db.list_subjects()?;
    Ok(Json(rows.into_iter().map(subject_response).collect()))
}

/// Text search on name and description, re-ranked by edit distance to the
/// name, then to the description.
pub async fn search_subjects(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Uuid>>> {
    let q = query.q.ok_or_else(|| ApiError::bad_request("Query required"))?;

    let Some(expr) = quizbank_db::fts::match_expr(&q) else {
        return Ok(Json(vec![]));
    };

    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.search_subjects(&expr))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))??;

    let candidates = rows
        .into_iter()
        .map(|row| SubjectCandidate {
            id: row.id,
            name: row.name,
            description: row.description,
        })
        .collect();

    let ranked = rank_subjects(&q, candidates);
    Ok(Json(ranked.iter().map(|id| util::parse_uuid(id)).collect()))
}

pub async fn get_subject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SubjectResponse>> {
    let row = state.db.get_subject(&id.to_string())?.ok_or_else(ApiError::not_found)?;
    Ok(Json(subject_response(row)))
}

pub async fn create_subject(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Json(req): Json<CreateSubjectRequest>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;

    if req.name.is_empty() || req.description.is_empty() {
        return Err(ApiError::bad_request("Name and description required"));
    }
    if state.db.subject_name_exists(&req.name)? {
        return Err(ApiError::Conflict("Subject already exists".into()));
    }

    let id = Uuid::new_v4();
    state.db.create_subject(&id.to_string(), &req.name, &req.description)?;

    Ok((
        StatusCode::CREATED,
        Json(SubjectResponse { id, name: req.name, description: req.description }),
    ))
}

/// Only the description is mutable; the name identifies the subject.
pub async fn update_subject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<MaybeUser>,
    Json(req): Json<UpdateSubjectRequest>,
) -> ApiResult<Json<SubjectResponse>> {
    user.require_admin()?;

    let mut row = state.db.get_subject(&id.to_string())?.ok_or_else(ApiError::not_found)?;
    if let Some(description) = req.description {
        state.db.update_subject_description(&row.id, &description)?;
        row.description = description;
    }
    Ok(Json(subject_response(row)))
}

pub async fn delete_subject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(user): Extension<MaybeUser>,
) -> ApiResult<impl IntoResponse> {
    user.require_admin()?;

    let id = id.to_string();
    if state.db.get_subject(&id)?.is_none() {
        return Err(ApiError::not_found());
    }
    // Refuse instead of leaving questions pointing at a missing subject.
    let referenced = state.db.count_questions_for_subject(&id)?;
    if referenced > 0 {
        return Err(ApiError::Conflict(format!(
            "Subject is referenced by {} question(s)",
            referenced
        )));
    }
    state.db.delete_subject(&id)?;
    Ok(StatusCode::OK)
}
