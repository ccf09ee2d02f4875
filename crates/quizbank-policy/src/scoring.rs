/// Attempt scoring. Derived on every read, never cached on the attempt:
/// editing an answer changes subsequent score reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptScore {
    pub num_correct: usize,
    pub num_incorrect: usize,
    pub num_unanswered: usize,
}

/// Score an attempt from per-answer correctness checks.
///
/// `checks` holds one bool per recorded answer (true = the submitted key
/// equalled the question's correct key). Unanswered is whatever remains of
/// the quiz; answers for questions outside the quiz are rejected at
/// submission time, so the subtraction cannot go negative in practice.
pub fn score_attempt(checks: &[bool], quiz_question_count: usize) -> AttemptScore {
    let num_correct = checks.iter().filter(|c| **c).count();
    AttemptScore {
        num_correct,
        num_incorrect: checks.len() - num_correct,
        num_unanswered: quiz_question_count.saturating_sub(checks.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_add_up() {
        let score = score_attempt(&[true, false, true, true], 10);
        assert_eq!(score.num_correct, 3);
        assert_eq!(score.num_incorrect, 1);
        assert_eq!(score.num_unanswered, 6);
        assert_eq!(score.num_correct + score.num_incorrect, 4);
        assert_eq!(score.num_correct + score.num_incorrect + score.num_unanswered, 10);
    }

    #[test]
    fn empty_attempt_is_all_unanswered() {
        let score = score_attempt(&[], 5);
        assert_eq!(score, AttemptScore { num_correct: 0, num_incorrect: 0, num_unanswered: 5 });
    }

    #[test]
    fn fully_answered_quiz_has_no_unanswered() {
        let score = score_attempt(&[true, true], 2);
        assert_eq!(score.num_unanswered, 0);
    }
}
