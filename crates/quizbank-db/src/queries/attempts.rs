use crate::Database;
use crate::models::{AttemptAnswerRow, AttemptRow};
use anyhow::Result;
use rusqlite::OptionalExtension;

fn read_attempt(row: &rusqlite::Row<'_>) -> rusqlite::Result<AttemptRow> {
    Ok(AttemptRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        quiz_id: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

impl Database {
    pub fn insert_attempt(
        &self,
        id: &str,
        user_id: &str,
        quiz_id: &str,
        answers: &[(String, i64)],
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO attempts (id, user_id, quiz_id) VALUES (?1, ?2, ?3)",
                [id, user_id, quiz_id],
            )?;
            for (question_id, answer_key) in answers {
                tx.execute(
                    "INSERT INTO attempt_answers (attempt_id, question_id, answer_key)
                     VALUES (?1, ?2, ?3)",
                    rusqlite::params![id, question_id, answer_key],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// The requester's attempt ids, newest first.
    pub fn list_attempt_ids(&self, user_id: &str, quiz_id: Option<&str>) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let ids = match quiz_id {
                Some(quiz_id) => {
                    let mut stmt = conn.prepare(
                        "SELECT id FROM attempts WHERE user_id = ?1 AND quiz_id = ?2
                         ORDER BY created_at DESC, updated_at DESC",
                    )?;
                    stmt.query_map([user_id, quiz_id], |row| row.get(0))?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id FROM attempts WHERE user_id = ?1
                         ORDER BY created_at DESC, updated_at DESC",
                    )?;
                    stmt.query_map([user_id], |row| row.get(0))?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
            };
            Ok(ids)
        })
    }

    /// Owner-scoped fetch; someone else's attempt looks like a missing one.
    pub fn get_attempt(&self, id: &str, user_id: &str) -> Result<Option<AttemptRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, user_id, quiz_id, created_at, updated_at
                     FROM attempts WHERE id = ?1 AND user_id = ?2",
                    [id, user_id],
                    read_attempt,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn get_attempt_answers(&self, attempt_id: &str) -> Result<Vec<AttemptAnswerRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT question_id, answer_key FROM attempt_answers WHERE attempt_id = ?1",
            )?;
            let rows = stmt
                .query_map([attempt_id], |row| {
                    Ok(AttemptAnswerRow { question_id: row.get(0)?, answer_key: row.get(1)? })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_attempt(&self, id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed =
                conn.execute("DELETE FROM attempts WHERE id = ?1 AND user_id = ?2", [id, user_id])?;
            Ok(changed > 0)
        })
    }

    /// Record an answer, replacing any existing answer for the same question
    /// — the (attempt_id, question_id) primary key makes duplication
    /// impossible. Returns true when the answer was newly inserted.
    pub fn upsert_attempt_answer(
        &self,
        attempt_id: &str,
        question_id: &str,
        answer_key: i64,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT answer_key FROM attempt_answers
                     WHERE attempt_id = ?1 AND question_id = ?2",
                    [attempt_id, question_id],
                    |row| row.get(0),
                )
                .optional()?;
            tx.execute(
                "INSERT INTO attempt_answers (attempt_id, question_id, answer_key)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(attempt_id, question_id) DO UPDATE SET answer_key = excluded.answer_key",
                rusqlite::params![attempt_id, question_id, answer_key],
            )?;
            tx.execute(
                "UPDATE attempts SET updated_at = datetime('now') WHERE id = ?1",
                [attempt_id],
            )?;
            tx.commit()?;
            Ok(existing.is_none())
        })
    }

    /// Returns false when there was no answer to remove.
    pub fn remove_attempt_answer(&self, attempt_id: &str, question_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "DELETE FROM attempt_answers WHERE attempt_id = ?1 AND question_id = ?2",
                [attempt_id, question_id],
            )?;
            if changed > 0 {
                tx.execute(
                    "UPDATE attempts SET updated_at = datetime('now') WHERE id = ?1",
                    [attempt_id],
                )?;
            }
            tx.commit()?;
            Ok(changed > 0)
        })
    }
}
