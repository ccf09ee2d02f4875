/// Database row types — these map directly to SQLite rows.
/// Distinct from the quizbank-types API models to keep the DB layer
/// independent of the wire format.

pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub is_admin: bool,
}

pub struct SubjectRow {
    pub id: String,
    pub name: String,
    pub description: String,
}

pub struct QuestionRow {
    pub id: String,
    pub question: String,
    pub description: String,
    pub description_mime: String,
    pub subject_id: String,
    pub correct_answer_key: i64,
    pub correct_answer_explanation: String,
    pub uploader_id: String,
    pub difficulty: String,
    pub verified: bool,
    pub generated_from: Option<String>,
}

pub struct AnswerRow {
    pub key: i64,
    pub text: String,
}

/// A text-index hit for question search, carrying what re-ranking needs.
pub struct QuestionHitRow {
    pub id: String,
    pub question: String,
    pub description: String,
    pub net_votes: i64,
}

pub struct QuizRow {
    pub id: String,
    pub name: String,
    pub creator_id: String,
    pub is_public: bool,
}

pub struct AttemptRow {
    pub id: String,
    pub user_id: String,
    pub quiz_id: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct AttemptAnswerRow {
    pub question_id: String,
    pub answer_key: i64,
}
