use crate::Database;
use anyhow::Result;

impl Database {
    /// All user ids, ordered by how many of their questions are verified.
    /// A single grouped JOIN instead of a count query per user.
    pub fn users_by_verified_count(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id
                 FROM users u
                 LEFT JOIN questions q ON q.uploader_id = u.id AND q.verified = 1
                 GROUP BY u.id
                 ORDER BY COUNT(q.id) DESC",
            )?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    /// All user ids, ordered by the aggregate net votes across their
    /// verified questions. A verified question nobody voted on joins with a
    /// NULL vote row and must contribute 0, not -1.
    pub fn users_by_total_net_votes(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id
                 FROM users u
                 LEFT JOIN questions q ON q.uploader_id = u.id AND q.verified = 1
                 LEFT JOIN upvotes v ON v.question_id = q.id
                 GROUP BY u.id
                 ORDER BY COALESCE(SUM(CASE v.upvote WHEN 1 THEN 1 WHEN 0 THEN -1 ELSE 0 END), 0) DESC",
            )?;
            let ids = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }
}
