use crate::Database;
use crate::models::QuizRow;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

fn read_quiz(row: &rusqlite::Row<'_>) -> rusqlite::Result<QuizRow> {
    Ok(QuizRow {
        id: row.get(0)?,
        name: row.get(1)?,
        creator_id: row.get(2)?,
        is_public: row.get(3)?,
    })
}

fn replace_questions(conn: &Connection, quiz_id: &str, question_ids: &[String]) -> Result<()> {
    conn.execute("DELETE FROM quiz_questions WHERE quiz_id = ?1", [quiz_id])?;
    for (position, qid) in question_ids.iter().enumerate() {
        conn.execute(
            "INSERT INTO quiz_questions (quiz_id, question_id, position) VALUES (?1, ?2, ?3)",
            rusqlite::params![quiz_id, qid, position as i64],
        )?;
    }
    Ok(())
}

impl Database {
    pub fn insert_quiz(
        &self,
        id: &str,
        name: &str,
        creator_id: &str,
        is_public: bool,
        question_ids: &[String],
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO quizzes (id, name, creator_id, is_public) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, name, creator_id, is_public],
            )?;
            replace_questions(&tx, id, question_ids)?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn quiz_name_exists(&self, name: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let id: Option<String> = conn
                .query_row("SELECT id FROM quizzes WHERE name = ?1", [name], |row| row.get(0))
                .optional()?;
            Ok(id.is_some())
        })
    }

    pub fn get_quiz(&self, id: &str) -> Result<Option<QuizRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, creator_id, is_public FROM quizzes WHERE id = ?1",
                    [id],
                    read_quiz,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Fetch under quiz visibility: when `public_only`, a private quiz is
    /// indistinguishable from a missing one.
    pub fn get_quiz_scoped(&self, id: &str, public_only: bool) -> Result<Option<QuizRow>> {
        self.with_conn(|conn| {
            let sql = if public_only {
                "SELECT id, name, creator_id, is_public FROM quizzes WHERE id = ?1 AND is_public = 1"
            } else {
                "SELECT id, name, creator_id, is_public FROM quizzes WHERE id = ?1"
            };
            let row = conn.query_row(sql, [id], read_quiz).optional()?;
            Ok(row)
        })
    }

    /// Membership in insertion order.
    pub fn quiz_question_ids(&self, quiz_id: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT question_id FROM quiz_questions WHERE quiz_id = ?1 ORDER BY position",
            )?;
            let ids = stmt
                .query_map([quiz_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    pub fn update_quiz(
        &self,
        id: &str,
        question_ids: Option<&[String]>,
        is_public: Option<bool>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if let Some(qs) = question_ids {
                replace_questions(&tx, id, qs)?;
            }
            if let Some(is_public) = is_public {
                tx.execute("UPDATE quizzes SET is_public = ?1 WHERE id = ?2", (is_public, id))?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    pub fn delete_quiz(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM quizzes WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    /// Append a question; returns false if it was already a member.
    pub fn add_quiz_question(&self, quiz_id: &str, question_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "INSERT OR IGNORE INTO quiz_questions (quiz_id, question_id, position)
                 VALUES (?1, ?2,
                     (SELECT COALESCE(MAX(position), -1) + 1 FROM quiz_questions WHERE quiz_id = ?1))",
                [quiz_id, question_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Returns false if the question was not a member.
    pub fn remove_quiz_question(&self, quiz_id: &str, question_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM quiz_questions WHERE quiz_id = ?1 AND question_id = ?2",
                [quiz_id, question_id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn quiz_contains_question(&self, quiz_id: &str, question_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let hit: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM quiz_questions WHERE quiz_id = ?1 AND question_id = ?2",
                    [quiz_id, question_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(hit.is_some())
        })
    }

    /// Quiz ids in case-sensitive lexical name order.
    pub fn list_quiz_ids(&self, public_only: bool) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let sql = if public_only {
                "SELECT id FROM quizzes WHERE is_public = 1 ORDER BY name"
            } else {
                "SELECT id FROM quizzes ORDER BY name"
            };
            let mut stmt = conn.prepare(sql)?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    /// Name search ordered by the store's native text relevance only; quiz
    /// search gets no distance re-ranking.
    pub fn search_quiz_ids(&self, match_expr: &str, public_only: bool) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let sql = if public_only {
                "SELECT z.id FROM quiz_fts
                 JOIN quizzes z ON z.rowid = quiz_fts.rowid
                 WHERE quiz_fts MATCH ?1 AND z.is_public = 1
                 ORDER BY rank"
            } else {
                "SELECT z.id FROM quiz_fts
                 JOIN quizzes z ON z.rowid = quiz_fts.rowid
                 WHERE quiz_fts MATCH ?1
                 ORDER BY rank"
            };
            let mut stmt = conn.prepare(sql)?;
            let ids = stmt
                .query_map([match_expr], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }
}
