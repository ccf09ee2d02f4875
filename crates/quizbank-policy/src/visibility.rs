use uuid::Uuid;

/// Who is asking. Admins bypass verification checks entirely; plain users see
/// the public set plus their own uploads; everyone else sees verified content
/// only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    Anonymous,
    User { id: Uuid, is_admin: bool },
}

impl Requester {
    pub fn is_admin(&self) -> bool {
        matches!(self, Requester::User { is_admin: true, .. })
    }
}

/// Verification constraint a question must satisfy to be visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifiedRule {
    /// No constraint (admin view).
    Any,
    /// Only verified questions.
    Required,
    /// Verified questions, or unverified ones uploaded by this user.
    UnlessUploadedBy(Uuid),
}

/// The predicate a question must satisfy to be included in a listing, search
/// or single fetch. `uploader` is conjunctive with the verified rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionScope {
    pub uploader: Option<Uuid>,
    pub verified: VerifiedRule,
}

impl QuestionScope {
    /// Point check, used for single-question fetches and for testing the
    /// policy without a store. A question failing this check is reported as
    /// not-found, never as forbidden.
    pub fn allows(&self, verified: bool, uploader: Uuid) -> bool {
        if let Some(want) = self.uploader {
            if uploader != want {
                return false;
            }
        }
        match self.verified {
            VerifiedRule::Any => true,
            VerifiedRule::Required => verified,
            VerifiedRule::UnlessUploadedBy(owner) => verified || uploader == owner,
        }
    }
}

/// Compute the visibility scope for questions.
///
/// Branches, in precedence order:
/// 1. admin: unconstrained by verification, uploader filter applied as-is
/// 2. user, no uploader filter: verified OR own
/// 3. user, filtering on self: all own questions
/// 4. user, filtering on someone else: that uploader's verified questions
/// 5. anonymous: verified only, uploader filter applied as-is
pub fn question_scope(requester: &Requester, uploader_filter: Option<Uuid>) -> QuestionScope {
    match *requester {
        Requester::User { is_admin: true, .. } => QuestionScope {
            uploader: uploader_filter,
            verified: VerifiedRule::Any,
        },
        Requester::User { id, .. } => match uploader_filter {
            None => QuestionScope {
                uploader: None,
                verified: VerifiedRule::UnlessUploadedBy(id),
            },
            Some(who) if who == id => QuestionScope {
                uploader: Some(id),
                verified: VerifiedRule::Any,
            },
            Some(who) => QuestionScope {
                uploader: Some(who),
                verified: VerifiedRule::Required,
            },
        },
        Requester::Anonymous => QuestionScope {
            uploader: uploader_filter,
            verified: VerifiedRule::Required,
        },
    }
}

/// Quiz visibility is simpler: non-admins only ever see public quizzes.
pub fn quiz_public_only(requester: &Requester) -> bool {
    !requester.is_admin()
}
