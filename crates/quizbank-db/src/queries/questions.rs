use crate::Database;
use crate::models::{AnswerRow, QuestionHitRow, QuestionRow};
use crate::scope::{SqlFilter, question_scope_filter};
use anyhow::Result;
use quizbank_policy::QuestionScope;
use rusqlite::{Connection, OptionalExtension, params_from_iter};

/// Net vote count of the question aliased `q`, inlined as a correlated
/// subquery so listings and searches get it in one pass.
const NET_VOTES: &str = "COALESCE((SELECT SUM(CASE WHEN v.upvote = 1 THEN 1 ELSE -1 END) \
     FROM upvotes v WHERE v.question_id = q.id), 0)";

const QUESTION_COLUMNS: &str = "q.id, q.question, q.description, q.description_mime, q.subject_id, \
     q.correct_answer_key, q.correct_answer_explanation, q.uploader_id, \
     q.difficulty, q.verified, q.generated_from";

fn read_question(row: &rusqlite::Row<'_>) -> rusqlite::Result<QuestionRow> {
    Ok(QuestionRow {
        id: row.get(0)?,
        question: row.get(1)?,
        description: row.get(2)?,
        description_mime: row.get(3)?,
        subject_id: row.get(4)?,
        correct_answer_key: row.get(5)?,
        correct_answer_explanation: row.get(6)?,
        uploader_id: row.get(7)?,
        difficulty: row.get(8)?,
        verified: row.get(9)?,
        generated_from: row.get(10)?,
    })
}

fn query_answers(conn: &Connection, question_id: &str) -> Result<Vec<AnswerRow>> {
    let mut stmt =
        conn.prepare("SELECT key, text FROM answers WHERE question_id = ?1 ORDER BY key")?;
    let rows = stmt
        .query_map([question_id], |row| {
            Ok(AnswerRow { key: row.get(0)?, text: row.get(1)? })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

impl Database {
    /// Insert a question together with its answers. The two tables form one
    /// logical document, so they go in a single transaction.
    pub fn insert_question(&self, question: &QuestionRow, answers: &[AnswerRow]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO questions (id, question, description, description_mime, subject_id,
                     correct_answer_key, correct_answer_explanation, uploader_id, difficulty,
                     verified, generated_from)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    question.id,
                    question.question,
                    question.description,
                    question.description_mime,
                    question.subject_id,
                    question.correct_answer_key,
                    question.correct_answer_explanation,
                    question.uploader_id,
                    question.difficulty,
                    question.verified,
                    question.generated_from,
                ],
            )?;
            for a in answers {
                tx.execute(
                    "INSERT INTO answers (question_id, key, text) VALUES (?1, ?2, ?3)",
                    rusqlite::params![question.id, a.key, a.text],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn question_text_exists(&self, text: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let id: Option<String> = conn
                .query_row("SELECT id FROM questions WHERE question = ?1", [text], |row| row.get(0))
                .optional()?;
            Ok(id.is_some())
        })
    }

    pub fn get_question(&self, id: &str) -> Result<Option<QuestionRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM questions q WHERE q.id = ?1", QUESTION_COLUMNS);
            let row = conn.query_row(&sql, [id], read_question).optional()?;
            Ok(row)
        })
    }

    /// Single-question fetch under a visibility scope. A question hidden by
    /// the scope comes back as None, indistinguishable from one that does not
    /// exist.
    pub fn get_question_scoped(&self, id: &str, scope: &QuestionScope) -> Result<Option<QuestionRow>> {
        let mut filter = SqlFilter::new();
        question_scope_filter(scope, &mut filter);

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM questions q WHERE q.id = ?1{}",
                QUESTION_COLUMNS,
                filter.render(2)
            );
            let mut params = vec![id.to_string()];
            params.extend(filter.params().iter().cloned());
            let row = conn
                .query_row(&sql, params_from_iter(params.iter()), read_question)
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_question_owned(&self, id: &str, uploader_id: &str) -> Result<Option<QuestionRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM questions q WHERE q.id = ?1 AND q.uploader_id = ?2",
                QUESTION_COLUMNS
            );
            let row = conn.query_row(&sql, [id, uploader_id], read_question).optional()?;
            Ok(row)
        })
    }

    pub fn get_answers(&self, question_id: &str) -> Result<Vec<AnswerRow>> {
        self.with_conn(|conn| query_answers(conn, question_id))
    }

    pub fn answer_keys(&self, question_id: &str) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT key FROM answers WHERE question_id = ?1")?;
            let keys = stmt
                .query_map([question_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(keys)
        })
    }

    pub fn correct_answer_key(&self, question_id: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let key = conn
                .query_row(
                    "SELECT correct_answer_key FROM questions WHERE id = ?1",
                    [question_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(key)
        })
    }

    pub fn question_verified(&self, question_id: &str) -> Result<Option<bool>> {
        self.with_conn(|conn| {
            let verified = conn
                .query_row("SELECT verified FROM questions WHERE id = ?1", [question_id], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(verified)
        })
    }

    /// Rewrite a question and its answers in place (answers are replaced
    /// wholesale, like the embedded array they model).
    pub fn update_question(&self, question: &QuestionRow, answers: &[AnswerRow]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE questions SET description = ?1, description_mime = ?2, subject_id = ?3,
                     correct_answer_key = ?4, correct_answer_explanation = ?5, difficulty = ?6
                 WHERE id = ?7",
                rusqlite::params![
                    question.description,
                    question.description_mime,
                    question.subject_id,
                    question.correct_answer_key,
                    question.correct_answer_explanation,
                    question.difficulty,
                    question.id,
                ],
            )?;
            tx.execute("DELETE FROM answers WHERE question_id = ?1", [&question.id])?;
            for a in answers {
                tx.execute(
                    "INSERT INTO answers (question_id, key, text) VALUES (?1, ?2, ?3)",
                    rusqlite::params![question.id, a.key, a.text],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn delete_question_owned(&self, id: &str, uploader_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM questions WHERE id = ?1 AND uploader_id = ?2",
                [id, uploader_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Returns false when the question does not exist.
    pub fn set_question_verified(&self, id: &str, verified: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let changed =
                conn.execute("UPDATE questions SET verified = ?1 WHERE id = ?2", (verified, id))?;
            Ok(changed > 0)
        })
    }

    /// Visible question ids ordered by net vote count, highest first.
    pub fn list_question_ids(
        &self,
        scope: &QuestionScope,
        subject: Option<&str>,
        difficulty: Option<&str>,
    ) -> Result<Vec<String>> {
        let mut filter = SqlFilter::new();
        question_scope_filter(scope, &mut filter);
        if let Some(subject) = subject {
            filter.push("q.subject_id = ?", [subject.to_string()]);
        }
        if let Some(difficulty) = difficulty {
            filter.push("q.difficulty = ?", [difficulty.to_string()]);
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT q.id FROM questions q WHERE 1 = 1{} ORDER BY {} DESC",
                filter.render(1),
                NET_VOTES
            );
            let mut stmt = conn.prepare(&sql)?;
            let ids = stmt
                .query_map(params_from_iter(filter.params().iter()), |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    /// Text-index hits for question search. Only indexed-field matches are
    /// candidates; ordering beyond the match is left to the policy crate.
    pub fn search_questions(
        &self,
        match_expr: &str,
        scope: &QuestionScope,
        subject: Option<&str>,
        difficulty: Option<&str>,
    ) -> Result<Vec<QuestionHitRow>> {
        let mut filter = SqlFilter::new();
        question_scope_filter(scope, &mut filter);
        if let Some(subject) = subject {
            filter.push("q.subject_id = ?", [subject.to_string()]);
        }
        if let Some(difficulty) = difficulty {
            filter.push("q.difficulty = ?", [difficulty.to_string()]);
        }

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT q.id, q.question, q.description, {} AS net_votes
                 FROM question_fts
                 JOIN questions q ON q.rowid = question_fts.rowid
                 WHERE question_fts MATCH ?1{}",
                NET_VOTES,
                filter.render(2)
            );
            let mut params = vec![match_expr.to_string()];
            params.extend(filter.params().iter().cloned());
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), |row| {
                    Ok(QuestionHitRow {
                        id: row.get(0)?,
                        question: row.get(1)?,
                        description: row.get(2)?,
                        net_votes: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
