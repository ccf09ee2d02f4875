//! Search re-ranking: full-text matching picks the candidates, then results
//! are ordered by edit distance to the query, closest first.

/// Levenshtein distance between two strings, char-wise and case-sensitive.
/// Two-row dynamic programming, O(|a| * |b|) time, O(|b|) space.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let sub = prev[j] + usize::from(ca != cb);
            cur[j + 1] = sub.min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// A question that matched the text index, with everything ranking needs.
#[derive(Debug, Clone)]
pub struct QuestionCandidate {
    pub id: String,
    pub question: String,
    pub description: String,
    pub net_votes: i64,
}

/// A subject that matched the text index.
#[derive(Debug, Clone)]
pub struct SubjectCandidate {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// Order matched questions by (distance to question text, distance to
/// description, net votes descending). The sort is stable, so candidates tied
/// on all three keys keep the order the store returned them in; that residual
/// order is not contractual.
pub fn rank_questions(query: &str, candidates: Vec<QuestionCandidate>) -> Vec<String> {
    let mut keyed: Vec<(usize, usize, i64, String)> = candidates
        .into_iter()
        .map(|c| {
            (
                levenshtein(&c.question, query),
                levenshtein(&c.description, query),
                c.net_votes,
                c.id,
            )
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)).then(b.2.cmp(&a.2)));
    keyed.into_iter().map(|(_, _, _, id)| id).collect()
}

/// Order matched subjects by (distance to name, distance to description).
pub fn rank_subjects(query: &str, candidates: Vec<SubjectCandidate>) -> Vec<String> {
    let mut keyed: Vec<(usize, usize, String)> = candidates
        .into_iter()
        .map(|c| (levenshtein(&c.name, query), levenshtein(&c.description, query), c.id))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    keyed.into_iter().map(|(_, _, id)| id).collect()
}
