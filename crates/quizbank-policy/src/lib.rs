//! Pure policy engine: who may see which questions and quizzes, how search
//! results are ordered, and how attempts are scored. Nothing in here touches
//! storage; the db crate translates scopes into SQL.

pub mod ranking;
pub mod scoring;
pub mod visibility;

pub use ranking::{QuestionCandidate, SubjectCandidate, levenshtein, rank_questions, rank_subjects};
pub use scoring::{AttemptScore, score_attempt};
pub use visibility::{Requester, QuestionScope, VerifiedRule, question_scope, quiz_public_only};
