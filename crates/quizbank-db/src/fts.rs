/// Build an FTS5 MATCH expression from a free-text user query.
///
/// The raw query cannot be passed to MATCH directly: characters like `?`, `+`
/// or `"` are FTS5 syntax. Tokenize on non-alphanumerics, quote every token,
/// and OR them together — the same any-word semantics the document store's
/// text search had. Returns None when the query holds no tokens at all, which
/// the callers treat as "matches nothing".
pub fn match_expr(query: &str) -> Option<String> {
    let tokens: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t))
        .collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" OR "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_and_ors_tokens() {
        assert_eq!(match_expr("binary search"), Some("\"binary\" OR \"search\"".into()));
    }

    #[test]
    fn strips_fts_syntax() {
        assert_eq!(match_expr("what is 2+2?"), Some("\"what\" OR \"is\" OR \"2\" OR \"2\"".into()));
        assert_eq!(match_expr("NEAR(\"a\")"), Some("\"NEAR\" OR \"a\"".into()));
    }

    #[test]
    fn empty_queries_match_nothing() {
        assert_eq!(match_expr(""), None);
        assert_eq!(match_expr("?!+-"), None);
        assert_eq!(match_expr("   "), None);
    }
}
