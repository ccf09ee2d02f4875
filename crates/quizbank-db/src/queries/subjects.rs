use crate::Database;
use crate::models::SubjectRow;
use anyhow::Result;
use rusqlite::OptionalExtension;

impl Database {
    pub fn create_subject(&self, id: &str, name: &str, description: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO subjects (id, name, description) VALUES (?1, ?2, ?3)",
                (id, name, description),
            )?;
            Ok(())
        })
    }

    pub fn subject_name_exists(&self, name: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let id: Option<String> = conn
                .query_row("SELECT id FROM subjects WHERE name = ?1", [name], |row| row.get(0))
                .optional()?;
            Ok(id.is_some())
        })
    }

    pub fn get_subject(&self, id: &str) -> Result<Option<SubjectRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, name, description FROM subjects WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(SubjectRow {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            description: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn list_subjects(&self) -> Result<Vec<SubjectRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name, description FROM subjects")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(SubjectRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Text-index hits for a subject search; ranking happens in the policy
    /// crate. `match_expr` comes from `fts::match_expr`.
    pub fn search_subjects(&self, match_expr: &str) -> Result<Vec<SubjectRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.id, s.name, s.description
                 FROM subject_fts
                 JOIN subjects s ON s.rowid = subject_fts.rowid
                 WHERE subject_fts MATCH ?1",
            )?;
            let rows = stmt
                .query_map([match_expr], |row| {
                    Ok(SubjectRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_subject_description(&self, id: &str, description: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE subjects SET description = ?1 WHERE id = ?2",
                (description, id),
            )?;
            Ok(())
        })
    }

    pub fn delete_subject(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM subjects WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    /// Questions still pointing at this subject; deletion is refused while
    /// any remain.
    pub fn count_questions_for_subject(&self, id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM questions WHERE subject_id = ?1",
                [id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }
}
