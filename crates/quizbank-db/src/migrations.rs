use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Schema notes: answers are child rows of their question (the embedded
/// subdocuments of the original document model), with (question_id, key)
/// uniqueness enforced by the primary key. The UNIQUE(question_id, user_id)
/// constraint on upvotes is the only concurrency guard for vote casting.
/// FTS5 tables shadow the text-indexed columns and are kept in sync by
/// triggers, standing in for the document store's text indexes.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            is_admin    INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS subjects (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS questions (
            id                          TEXT PRIMARY KEY,
            question                    TEXT NOT NULL UNIQUE,
            description                 TEXT NOT NULL DEFAULT '',
            description_mime            TEXT NOT NULL DEFAULT 'text/plain',
            subject_id                  TEXT NOT NULL REFERENCES subjects(id),
            correct_answer_key          INTEGER NOT NULL,
            correct_answer_explanation  TEXT NOT NULL DEFAULT '',
            uploader_id                 TEXT NOT NULL REFERENCES users(id),
            difficulty                  TEXT NOT NULL,
            verified                    INTEGER NOT NULL DEFAULT 0,
            generated_from              TEXT REFERENCES questions(id),
            created_at                  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_questions_uploader
            ON questions(uploader_id, verified);
        CREATE INDEX IF NOT EXISTS idx_questions_subject
            ON questions(subject_id);

        CREATE TABLE IF NOT EXISTS answers (
            question_id TEXT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
            key         INTEGER NOT NULL,
            text        TEXT NOT NULL,
            PRIMARY KEY (question_id, key)
        );

        CREATE TABLE IF NOT EXISTS upvotes (
            question_id TEXT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id),
            upvote      INTEGER NOT NULL,
            UNIQUE(question_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_upvotes_question
            ON upvotes(question_id);

        CREATE TABLE IF NOT EXISTS quizzes (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL UNIQUE,
            creator_id  TEXT NOT NULL REFERENCES users(id),
            is_public   INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS quiz_questions (
            quiz_id     TEXT NOT NULL REFERENCES quizzes(id) ON DELETE CASCADE,
            question_id TEXT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
            position    INTEGER NOT NULL,
            PRIMARY KEY (quiz_id, question_id)
        );

        CREATE TABLE IF NOT EXISTS attempts (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id),
            quiz_id     TEXT NOT NULL REFERENCES quizzes(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_attempts_user
            ON attempts(user_id, quiz_id);

        CREATE TABLE IF NOT EXISTS attempt_answers (
            attempt_id  TEXT NOT NULL REFERENCES attempts(id) ON DELETE CASCADE,
            question_id TEXT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
            answer_key  INTEGER NOT NULL,
            PRIMARY KEY (attempt_id, question_id)
        );

        -- Full-text indexes

        CREATE VIRTUAL TABLE IF NOT EXISTS question_fts USING fts5(
            question, description,
            content='questions', content_rowid='rowid'
        );
        CREATE TRIGGER IF NOT EXISTS question_fts_ai AFTER INSERT ON questions BEGIN
            INSERT INTO question_fts(rowid, question, description)
                VALUES (new.rowid, new.question, new.description);
        END;
        CREATE TRIGGER IF NOT EXISTS question_fts_ad AFTER DELETE ON questions BEGIN
            INSERT INTO question_fts(question_fts, rowid, question, description)
                VALUES ('delete', old.rowid, old.question, old.description);
        END;
        CREATE TRIGGER IF NOT EXISTS question_fts_au AFTER UPDATE ON questions BEGIN
            INSERT INTO question_fts(question_fts, rowid, question, description)
                VALUES ('delete', old.rowid, old.question, old.description);
            INSERT INTO question_fts(rowid, question, description)
                VALUES (new.rowid, new.question, new.description);
        END;

        CREATE VIRTUAL TABLE IF NOT EXISTS subject_fts USING fts5(
            name, description,
            content='subjects', content_rowid='rowid'
        );
        CREATE TRIGGER IF NOT EXISTS subject_fts_ai AFTER INSERT ON subjects BEGIN
            INSERT INTO subject_fts(rowid, name, description)
                VALUES (new.rowid, new.name, new.description);
        END;
        CREATE TRIGGER IF NOT EXISTS subject_fts_ad AFTER DELETE ON subjects BEGIN
            INSERT INTO subject_fts(subject_fts, rowid, name, description)
                VALUES ('delete', old.rowid, old.name, old.description);
        END;
        CREATE TRIGGER IF NOT EXISTS subject_fts_au AFTER UPDATE ON subjects BEGIN
            INSERT INTO subject_fts(subject_fts, rowid, name, description)
                VALUES ('delete', old.rowid, old.name, old.description);
            INSERT INTO subject_fts(rowid, name, description)
                VALUES (new.rowid, new.name, new.description);
        END;

        CREATE VIRTUAL TABLE IF NOT EXISTS quiz_fts USING fts5(
            name,
            content='quizzes', content_rowid='rowid'
        );
        CREATE TRIGGER IF NOT EXISTS quiz_fts_ai AFTER INSERT ON quizzes BEGIN
            INSERT INTO quiz_fts(rowid, name) VALUES (new.rowid, new.name);
        END;
        CREATE TRIGGER IF NOT EXISTS quiz_fts_ad AFTER DELETE ON quizzes BEGIN
            INSERT INTO quiz_fts(quiz_fts, rowid, name) VALUES ('delete', old.rowid, old.name);
        END;
        CREATE TRIGGER IF NOT EXISTS quiz_fts_au AFTER UPDATE ON quizzes BEGIN
            INSERT INTO quiz_fts(quiz_fts, rowid, name) VALUES ('delete', old.rowid, old.name);
            INSERT INTO quiz_fts(rowid, name) VALUES (new.rowid, new.name);
        END;
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
