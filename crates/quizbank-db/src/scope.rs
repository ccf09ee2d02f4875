//! Thin adapter translating policy scopes into SQL `WHERE` fragments.
//! The policy itself lives in quizbank-policy and never sees SQL.

use quizbank_policy::{QuestionScope, VerifiedRule};

/// Accumulates conjunctive clauses and their positional string parameters.
/// All values bound here are TEXT (uuids, difficulty names); the verified
/// flag is emitted as a literal since it never comes from user input.
pub(crate) struct SqlFilter {
    clauses: Vec<String>,
    params: Vec<String>,
}

impl SqlFilter {
    pub fn new() -> Self {
        Self { clauses: Vec::new(), params: Vec::new() }
    }

    pub fn push(&mut self, clause: impl Into<String>, params: impl IntoIterator<Item = String>) {
        self.clauses.push(clause.into());
        self.params.extend(params);
    }

    /// Render the clauses, numbering placeholders starting at `first_param`.
    /// Clauses are written with `?` and rewritten here so callers can bind
    /// leading parameters (like an FTS MATCH string) before these.
    pub fn render(&self, first_param: usize) -> String {
        let mut n = first_param;
        self.clauses
            .iter()
            .map(|c| {
                let mut out = String::with_capacity(c.len() + 4);
                for ch in c.chars() {
                    if ch == '?' {
                        out.push_str(&format!("?{}", n));
                        n += 1;
                    } else {
                        out.push(ch);
                    }
                }
                format!(" AND {}", out)
            })
            .collect()
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }
}

/// Translate a question visibility scope to SQL against alias `q`.
pub(crate) fn question_scope_filter(scope: &QuestionScope, filter: &mut SqlFilter) {
    if let Some(uploader) = scope.uploader {
        filter.push("q.uploader_id = ?", [uploader.to_string()]);
    }
    match scope.verified {
        VerifiedRule::Any => {}
        VerifiedRule::Required => filter.push("q.verified = 1", []),
        VerifiedRule::UnlessUploadedBy(owner) => {
            filter.push("(q.verified = 1 OR q.uploader_id = ?)", [owner.to_string()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizbank_policy::{Requester, question_scope};
    use uuid::Uuid;

    #[test]
    fn renders_numbered_placeholders() {
        let me = Uuid::from_u128(7);
        let scope = question_scope(&Requester::User { id: me, is_admin: false }, None);
        let mut filter = SqlFilter::new();
        question_scope_filter(&scope, &mut filter);
        filter.push("q.subject_id = ?", ["s1".to_string()]);

        assert_eq!(
            filter.render(2),
            " AND (q.verified = 1 OR q.uploader_id = ?2) AND q.subject_id = ?3"
        );
        assert_eq!(filter.params(), &[me.to_string(), "s1".to_string()]);
    }

    #[test]
    fn admin_scope_renders_empty() {
        let scope = question_scope(&Requester::User { id: Uuid::from_u128(1), is_admin: true }, None);
        let mut filter = SqlFilter::new();
        question_scope_filter(&scope, &mut filter);
        assert_eq!(filter.render(1), "");
        assert!(filter.params().is_empty());
    }
}
