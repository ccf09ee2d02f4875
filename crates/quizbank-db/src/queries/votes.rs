use crate::Database;
use anyhow::Result;
use rusqlite::OptionalExtension;

impl Database {
    /// Cast or change a vote. The UNIQUE(question_id, user_id) constraint
    /// plus ON CONFLICT flip the existing record in place, so concurrent
    /// casts for the same pair coalesce instead of duplicating.
    pub fn cast_vote(&self, question_id: &str, user_id: &str, upvote: bool) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO upvotes (question_id, user_id, upvote) VALUES (?1, ?2, ?3)
                 ON CONFLICT(question_id, user_id) DO UPDATE SET upvote = excluded.upvote",
                rusqlite::params![question_id, user_id, upvote],
            )?;
            Ok(())
        })
    }

    /// Removing a vote that does not exist is a no-op.
    pub fn remove_vote(&self, question_id: &str, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM upvotes WHERE question_id = ?1 AND user_id = ?2",
                [question_id, user_id],
            )?;
            Ok(())
        })
    }

    /// Some(true) = upvoted, Some(false) = downvoted, None = no vote.
    pub fn get_vote(&self, question_id: &str, user_id: &str) -> Result<Option<bool>> {
        self.with_conn(|conn| {
            let vote = conn
                .query_row(
                    "SELECT upvote FROM upvotes WHERE question_id = ?1 AND user_id = ?2",
                    [question_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(vote)
        })
    }

    pub fn count_upvotes(&self, question_id: &str) -> Result<i64> {
        self.count_votes(question_id, true)
    }

    pub fn count_downvotes(&self, question_id: &str) -> Result<i64> {
        self.count_votes(question_id, false)
    }

    pub fn net_votes(&self, question_id: &str) -> Result<i64> {
        Ok(self.count_upvotes(question_id)? - self.count_downvotes(question_id)?)
    }

    fn count_votes(&self, question_id: &str, upvote: bool) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM upvotes WHERE question_id = ?1 AND upvote = ?2",
                rusqlite::params![question_id, upvote],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }
}
