use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Difficulty;

// Wire format is camelCase throughout: this API serves the same frontend
// contract the platform always had.

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub token: String,
}

/// Own profile: includes the admin flag.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

/// Another user's profile: never exposes the admin flag.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAdminRequest {
    #[serde(default)]
    pub is_admin: bool,
}

// -- Subjects --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateSubjectRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateSubjectRequest {
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

// -- Questions --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnswerBody {
    pub key: i64,
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateQuestionRequest {
    pub question: String,
    pub description: Option<String>,
    #[serde(rename = "descriptionMIME")]
    pub description_mime: Option<String>,
    pub subject: Uuid,
    pub answers: Vec<AnswerBody>,
    pub correct_answer_key: i64,
    pub correct_answer_explanation: Option<String>,
    pub difficulty: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateQuestionRequest {
    pub description: Option<String>,
    #[serde(rename = "descriptionMIME")]
    pub description_mime: Option<String>,
    pub subject: Option<Uuid>,
    pub answers: Option<Vec<AnswerBody>>,
    pub correct_answer_key: Option<i64>,
    pub correct_answer_explanation: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: Uuid,
    pub question: String,
    pub description: String,
    #[serde(rename = "descriptionMIME")]
    pub description_mime: String,
    pub subject: SubjectResponse,
    pub answers: Vec<AnswerBody>,
    pub correct_answer_key: i64,
    pub correct_answer_explanation: String,
    pub uploader: Uuid,
    pub difficulty: Difficulty,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_from: Option<Uuid>,
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub upvoted: bool,
    pub downvoted: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MutateRequest {
    pub original_question_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutateResponse {
    pub new_question_id: Uuid,
    pub question: QuestionResponse,
}

// -- Quizzes --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateQuizRequest {
    pub name: String,
    pub questions: Vec<Uuid>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateQuizRequest {
    pub questions: Option<Vec<Uuid>>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResponse {
    pub id: Uuid,
    pub name: String,
    pub questions: Vec<Uuid>,
    pub creator: Uuid,
    pub is_public: bool,
}

// -- Attempts --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AttemptAnswerBody {
    pub question: Uuid,
    pub answer_key: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateAttemptRequest {
    pub quiz: Uuid,
    pub answers: Vec<AttemptAnswerBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubmitAnswerRequest {
    pub answer_key: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredAnswer {
    pub question: Uuid,
    pub answer_key: i64,
    pub correct: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub quiz: Uuid,
    pub answers: Vec<ScoredAnswer>,
    pub num_correct: usize,
    pub num_incorrect: usize,
    pub num_unanswered: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Voting --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCountResponse {
    pub upvote_count: i64,
    pub downvote_count: i64,
}
