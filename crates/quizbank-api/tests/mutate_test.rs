use std::sync::Arc;

use async_trait::async_trait;
use axum::{Extension, Json, extract::State};
use uuid::Uuid;

use quizbank_api::error::ApiError;
use quizbank_api::generate::{GeneratorInput, QuestionDraft, QuestionGenerator};
use quizbank_api::middleware::{CurrentUser, MaybeUser};
use quizbank_api::questions::mutate_question;
use quizbank_api::state::{AppState, AppStateInner};
use quizbank_db::Database;
use quizbank_db::models::{AnswerRow, QuestionRow};
use quizbank_policy::{Requester, question_scope};
use quizbank_types::api::{AnswerBody, MutateRequest};

struct CannedGenerator {
    draft: QuestionDraft,
}

#[async_trait]
impl QuestionGenerator for CannedGenerator {
    async fn generate_variant(&self, _original: &GeneratorInput) -> anyhow::Result<QuestionDraft> {
        Ok(self.draft.clone())
    }
}

struct FailingGenerator;

#[async_trait]
impl QuestionGenerator for FailingGenerator {
    async fn generate_variant(&self, _original: &GeneratorInput) -> anyhow::Result<QuestionDraft> {
        Err(anyhow::anyhow!("model unavailable"))
    }
}

fn draft(question: &str) -> QuestionDraft {
    QuestionDraft {
        question: question.to_string(),
        description: Some("a generated variant".to_string()),
        answers: vec![
            AnswerBody { key: 1, text: "5".to_string() },
            AnswerBody { key: 2, text: "6".to_string() },
        ],
        correct_answer_key: 1,
        correct_answer_explanation: Some("because".to_string()),
        difficulty: "EASY".to_string(),
    }
}

fn state_with(generator: Box<dyn QuestionGenerator>) -> AppState {
    let db = Database::open_in_memory().unwrap();
    Arc::new(AppStateInner { db, jwt_secret: "test-secret".to_string(), generator })
}

fn seed_original(state: &AppState, uploader: Uuid) -> String {
    state
        .db
        .create_user(&uploader.to_string(), "alice", "alice@example.com", "hash")
        .unwrap();
    let subject_id = Uuid::new_v4().to_string();
    state.db.create_subject(&subject_id, "Algebra", "equations and such").unwrap();

    let question = QuestionRow {
        id: Uuid::new_v4().to_string(),
        question: "What is 2+3?".to_string(),
        description: String::new(),
        description_mime: "text/plain".to_string(),
        subject_id,
        correct_answer_key: 1,
        correct_answer_explanation: String::new(),
        uploader_id: uploader.to_string(),
        difficulty: "EASY".to_string(),
        verified: true,
        generated_from: None,
    };
    let answers = vec![
        AnswerRow { key: 1, text: "5".to_string() },
        AnswerRow { key: 2, text: "6".to_string() },
    ];
    state.db.insert_question(&question, &answers).unwrap();
    question.id
}

fn logged_in(id: Uuid, is_admin: bool) -> MaybeUser {
    MaybeUser(Some(CurrentUser {
        id,
        name: "alice".to_string(),
        email: "alice@example.com".to_string(),
        is_admin,
    }))
}

fn all_question_ids(state: &AppState) -> Vec<String> {
    let scope = question_scope(&Requester::User { id: Uuid::from_u128(99), is_admin: true }, None);
    state.db.list_question_ids(&scope, None, None).unwrap()
}

#[tokio::test]
async fn mutate_links_variant_to_its_original() {
    let requester = Uuid::from_u128(1);
    let state = state_with(Box::new(CannedGenerator { draft: draft("What is two plus three?") }));
    let original_id = seed_original(&state, requester);

    let result = mutate_question(
        State(state.clone()),
        Extension(logged_in(requester, false)),
        Json(MutateRequest { original_question_id: original_id.parse().unwrap() }),
    )
    .await;
    assert!(result.is_ok());

    let ids = all_question_ids(&state);
    assert_eq!(ids.len(), 2);
    let new_id = ids.into_iter().find(|id| *id != original_id).unwrap();
    let row = state.db.get_question(&new_id).unwrap().unwrap();
    assert_eq!(row.question, "What is two plus three?");
    assert_eq!(row.generated_from.as_deref(), Some(original_id.as_str()));
    // A plain user's variant starts unverified.
    assert!(!row.verified);
}

#[tokio::test]
async fn admin_variants_are_born_verified() {
    let requester = Uuid::from_u128(1);
    let state = state_with(Box::new(CannedGenerator { draft: draft("What sum is 2+3?") }));
    let original_id = seed_original(&state, requester);

    mutate_question(
        State(state.clone()),
        Extension(logged_in(requester, true)),
        Json(MutateRequest { original_question_id: original_id.parse().unwrap() }),
    )
    .await
    .unwrap();

    let new_id =
        all_question_ids(&state).into_iter().find(|id| *id != original_id).unwrap();
    assert!(state.db.get_question(&new_id).unwrap().unwrap().verified);
}

#[tokio::test]
async fn generator_failure_surfaces_as_internal_and_writes_nothing() {
    let requester = Uuid::from_u128(1);
    let state = state_with(Box::new(FailingGenerator));
    let original_id = seed_original(&state, requester);

    let err = mutate_question(
        State(state.clone()),
        Extension(logged_in(requester, false)),
        Json(MutateRequest { original_question_id: original_id.parse().unwrap() }),
    )
    .await
    .err()
    .unwrap();
    assert!(matches!(err, ApiError::Internal(_)));
    assert_eq!(all_question_ids(&state).len(), 1);
}

#[tokio::test]
async fn duplicate_draft_text_conflicts() {
    let requester = Uuid::from_u128(1);
    // The draft collides with the original's own text.
    let state = state_with(Box::new(CannedGenerator { draft: draft("What is 2+3?") }));
    let original_id = seed_original(&state, requester);

    let err = mutate_question(
        State(state.clone()),
        Extension(logged_in(requester, false)),
        Json(MutateRequest { original_question_id: original_id.parse().unwrap() }),
    )
    .await
    .err()
    .unwrap();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(all_question_ids(&state).len(), 1);
}

#[tokio::test]
async fn anonymous_requester_cannot_mutate() {
    let state = state_with(Box::new(FailingGenerator));
    let original_id = seed_original(&state, Uuid::from_u128(1));

    let err = mutate_question(
        State(state.clone()),
        Extension(MaybeUser(None)),
        Json(MutateRequest { original_question_id: original_id.parse().unwrap() }),
    )
    .await
    .err()
    .unwrap();
    assert!(matches!(err, ApiError::Unauthorized(_)));
}
