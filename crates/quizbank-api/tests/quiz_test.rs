use std::sync::Arc;

use async_trait::async_trait;
use axum::{Extension, Json, extract::Path, extract::State};
use uuid::Uuid;

use quizbank_api::error::ApiError;
use quizbank_api::generate::{GeneratorInput, QuestionDraft, QuestionGenerator};
use quizbank_api::middleware::{CurrentUser, MaybeUser};
use quizbank_api::quizzes::{add_question, create_quiz, get_quiz};
use quizbank_api::state::{AppState, AppStateInner};
use quizbank_db::Database;
use quizbank_db::models::{AnswerRow, QuestionRow};
use quizbank_types::api::CreateQuizRequest;

struct UnusedGenerator;

#[async_trait]
impl QuestionGenerator for UnusedGenerator {
    async fn generate_variant(&self, _original: &GeneratorInput) -> anyhow::Result<QuestionDraft> {
        unreachable!("quiz tests never generate")
    }
}

fn state() -> AppState {
    let db = Database::open_in_memory().unwrap();
    Arc::new(AppStateInner {
        db,
        jwt_secret: "test-secret".to_string(),
        generator: Box::new(UnusedGenerator),
    })
}

fn admin() -> MaybeUser {
    MaybeUser(Some(CurrentUser {
        id: Uuid::from_u128(1),
        name: "root".to_string(),
        email: "root@example.com".to_string(),
        is_admin: true,
    }))
}

fn plain_user() -> MaybeUser {
    MaybeUser(Some(CurrentUser {
        id: Uuid::from_u128(2),
        name: "bob".to_string(),
        email: "bob@example.com".to_string(),
        is_admin: false,
    }))
}

fn seed_question(state: &AppState, verified: bool) -> Uuid {
    let uploader = Uuid::from_u128(1).to_string();
    if state.db.get_user_by_id(&uploader).unwrap().is_none() {
        state.db.create_user(&uploader, "root", "root@example.com", "hash").unwrap();
    }
    let subject_id = Uuid::new_v4().to_string();
    state.db.create_subject(&subject_id, format!("S-{subject_id}").as_str(), "d").unwrap();

    let id = Uuid::new_v4();
    let question = QuestionRow {
        id: id.to_string(),
        question: format!("Q-{id}"),
        description: String::new(),
        description_mime: "text/plain".to_string(),
        subject_id,
        correct_answer_key: 1,
        correct_answer_explanation: String::new(),
        uploader_id: uploader,
        difficulty: "EASY".to_string(),
        verified,
        generated_from: None,
    };
    let answers = vec![AnswerRow { key: 1, text: "yes".to_string() }];
    state.db.insert_question(&question, &answers).unwrap();
    id
}

#[tokio::test]
async fn unverified_member_rejects_the_whole_quiz() {
    let state = state();
    let verified = seed_question(&state, true);
    let unverified = seed_question(&state, false);

    let err = create_quiz(
        State(state.clone()),
        Extension(admin()),
        Json(CreateQuizRequest {
            name: "Midterm".to_string(),
            questions: vec![verified, unverified],
            is_public: Some(true),
        }),
    )
    .await
    .err()
    .unwrap();
    assert!(matches!(err, ApiError::BadRequest(_)));

    // Nothing was created.
    assert!(state.db.list_quiz_ids(false).unwrap().is_empty());
}

#[tokio::test]
async fn non_admin_cannot_create_and_cannot_see_private() {
    let state = state();
    let question = seed_question(&state, true);

    let err = create_quiz(
        State(state.clone()),
        Extension(plain_user()),
        Json(CreateQuizRequest {
            name: "Sneaky".to_string(),
            questions: vec![question],
            is_public: Some(false),
        }),
    )
    .await
    .err()
    .unwrap();
    // Admin gates hide the route rather than forbidding it.
    assert!(matches!(err, ApiError::NotFound(_)));

    create_quiz(
        State(state.clone()),
        Extension(admin()),
        Json(CreateQuizRequest {
            name: "Private".to_string(),
            questions: vec![question],
            is_public: Some(false),
        }),
    )
    .await
    .unwrap();

    let quiz_id: Uuid = state.db.list_quiz_ids(false).unwrap()[0].parse().unwrap();
    let err = get_quiz(State(state.clone()), Extension(plain_user()), Path(quiz_id))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert!(get_quiz(State(state.clone()), Extension(admin()), Path(quiz_id)).await.is_ok());
}

#[tokio::test]
async fn membership_add_is_idempotent_at_the_store() {
    let state = state();
    let first = seed_question(&state, true);
    let second = seed_question(&state, true);

    create_quiz(
        State(state.clone()),
        Extension(admin()),
        Json(CreateQuizRequest {
            name: "Finals".to_string(),
            questions: vec![first],
            is_public: Some(true),
        }),
    )
    .await
    .unwrap();
    let quiz_id: Uuid = state.db.list_quiz_ids(false).unwrap()[0].parse().unwrap();

    assert!(
        add_question(State(state.clone()), Extension(admin()), Path((quiz_id, second)))
            .await
            .is_ok()
    );
    // Adding it again succeeds without duplicating the membership.
    assert!(
        add_question(State(state.clone()), Extension(admin()), Path((quiz_id, second)))
            .await
            .is_ok()
    );
    assert_eq!(state.db.quiz_question_ids(&quiz_id.to_string()).unwrap().len(), 2);

    // An unverified question cannot be appended either.
    let unverified = seed_question(&state, false);
    let err = add_question(State(state.clone()), Extension(admin()), Path((quiz_id, unverified)))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ApiError::BadRequest(_)));
}
