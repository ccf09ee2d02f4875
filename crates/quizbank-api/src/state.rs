use std::sync::Arc;

use quizbank_db::Database;

use crate::generate::QuestionGenerator;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub generator: Box<dyn QuestionGenerator>,
}
