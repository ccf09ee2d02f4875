use quizbank_db::Database;
use quizbank_db::models::{AnswerRow, QuestionRow};
use quizbank_policy::{Requester, question_scope};
use uuid::Uuid;

fn db() -> Database {
    Database::open_in_memory().expect("in-memory db")
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn seed_user(db: &Database, name: &str) -> String {
    let id = new_id();
    db.create_user(&id, name, &format!("{name}@example.com"), "hash").unwrap();
    id
}

fn seed_subject(db: &Database, name: &str) -> String {
    let id = new_id();
    db.create_subject(&id, name, &format!("all about {name}")).unwrap();
    id
}

fn seed_question(db: &Database, text: &str, subject: &str, uploader: &str, verified: bool) -> String {
    let id = new_id();
    let row = QuestionRow {
        id: id.clone(),
        question: text.to_string(),
        description: String::new(),
        description_mime: "text/plain".to_string(),
        subject_id: subject.to_string(),
        correct_answer_key: 1,
        correct_answer_explanation: String::new(),
        uploader_id: uploader.to_string(),
        difficulty: "EASY".to_string(),
        verified,
        generated_from: None,
    };
    let answers = [
        AnswerRow { key: 1, text: "yes".into() },
        AnswerRow { key: 2, text: "no".into() },
    ];
    db.insert_question(&row, &answers).unwrap();
    id
}

#[test]
fn vote_flip_and_unvote_keep_invariants() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let bob = seed_user(&db, "bob");
    let subject = seed_subject(&db, "algebra");
    let q = seed_question(&db, "What is 2+2?", &subject, &alice, true);

    db.cast_vote(&q, &bob, true).unwrap();
    assert_eq!(db.count_upvotes(&q).unwrap(), 1);
    assert_eq!(db.count_downvotes(&q).unwrap(), 0);
    assert_eq!(db.get_vote(&q, &bob).unwrap(), Some(true));

    // Casting again with the opposite direction flips the record in place.
    db.cast_vote(&q, &bob, false).unwrap();
    assert_eq!(db.count_upvotes(&q).unwrap(), 0);
    assert_eq!(db.count_downvotes(&q).unwrap(), 1);
    assert_eq!(db.net_votes(&q).unwrap(), -1);
    assert_eq!(
        db.net_votes(&q).unwrap(),
        db.count_upvotes(&q).unwrap() - db.count_downvotes(&q).unwrap()
    );

    db.remove_vote(&q, &bob).unwrap();
    assert_eq!(db.get_vote(&q, &bob).unwrap(), None);
    assert_eq!(db.net_votes(&q).unwrap(), 0);

    // Unvoting when no vote exists is a no-op, not an error.
    db.remove_vote(&q, &bob).unwrap();
}

#[test]
fn listing_orders_by_net_votes_desc() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let bob = seed_user(&db, "bob");
    let carol = seed_user(&db, "carol");
    let subject = seed_subject(&db, "graphs");
    let q_low = seed_question(&db, "BFS or DFS?", &subject, &alice, true);
    let q_high = seed_question(&db, "What is a spanning tree?", &subject, &alice, true);

    db.cast_vote(&q_high, &bob, true).unwrap();
    db.cast_vote(&q_high, &carol, true).unwrap();
    db.cast_vote(&q_low, &bob, false).unwrap();

    let scope = question_scope(&Requester::Anonymous, None);
    let ids = db.list_question_ids(&scope, None, None).unwrap();
    assert_eq!(ids, vec![q_high, q_low]);
}

#[test]
fn scoped_fetch_hides_unverified_from_outsiders() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let subject = seed_subject(&db, "calculus");
    let q = seed_question(&db, "Derivative of x^2?", &subject, &alice, false);

    let anon = question_scope(&Requester::Anonymous, None);
    assert!(db.get_question_scoped(&q, &anon).unwrap().is_none());

    let owner_id: Uuid = alice.parse().unwrap();
    let owner = question_scope(&Requester::User { id: owner_id, is_admin: false }, None);
    assert!(db.get_question_scoped(&q, &owner).unwrap().is_some());

    let admin = question_scope(&Requester::User { id: Uuid::new_v4(), is_admin: true }, None);
    assert!(db.get_question_scoped(&q, &admin).unwrap().is_some());
}

#[test]
fn search_only_returns_text_index_hits_in_scope() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let subject = seed_subject(&db, "algebra");
    let hit = seed_question(&db, "Solve the algebra equation", &subject, &alice, true);
    let hidden = seed_question(&db, "Unverified algebra teaser", &subject, &alice, false);
    let _miss = seed_question(&db, "Name the capital of France", &subject, &alice, true);

    let expr = quizbank_db::fts::match_expr("algebra").unwrap();
    let scope = question_scope(&Requester::Anonymous, None);
    let hits = db.search_questions(&expr, &scope, None, None).unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec![hit.as_str()]);
    assert!(!ids.contains(&hidden.as_str()));
}

#[test]
fn subject_and_difficulty_filters_are_conjunctive() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let algebra = seed_subject(&db, "algebra");
    let geometry = seed_subject(&db, "geometry");
    let q_algebra = seed_question(&db, "Factor x^2-1", &algebra, &alice, true);
    let _q_geometry = seed_question(&db, "Angles of a triangle", &geometry, &alice, true);

    let scope = question_scope(&Requester::Anonymous, None);
    let ids = db.list_question_ids(&scope, Some(&algebra), Some("EASY")).unwrap();
    assert_eq!(ids, vec![q_algebra.clone()]);

    let ids = db.list_question_ids(&scope, Some(&algebra), Some("HARD")).unwrap();
    assert!(ids.is_empty());
}

#[test]
fn quiz_visibility_and_name_order() {
    let db = db();
    let admin = seed_user(&db, "admin");
    db.insert_quiz(&new_id(), "Zeta quiz", &admin, true, &[]).unwrap();
    let beta = new_id();
    db.insert_quiz(&beta, "Beta quiz", &admin, false, &[]).unwrap();
    let alpha = new_id();
    db.insert_quiz(&alpha, "Alpha quiz", &admin, true, &[]).unwrap();

    let public = db.list_quiz_ids(true).unwrap();
    assert_eq!(public.first(), Some(&alpha));
    assert!(!public.contains(&beta));

    let all = db.list_quiz_ids(false).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[1], beta);

    // Private quiz fetch under public-only scope looks like not-found.
    assert!(db.get_quiz_scoped(&beta, true).unwrap().is_none());
    assert!(db.get_quiz_scoped(&beta, false).unwrap().is_some());
}

#[test]
fn quiz_membership_add_and_remove() {
    let db = db();
    let admin = seed_user(&db, "admin");
    let subject = seed_subject(&db, "logic");
    let q1 = seed_question(&db, "P implies Q?", &subject, &admin, true);
    let q2 = seed_question(&db, "Truth table of XOR?", &subject, &admin, true);
    let quiz = new_id();
    db.insert_quiz(&quiz, "Logic 101", &admin, true, &[q1.clone()]).unwrap();

    assert!(db.add_quiz_question(&quiz, &q2).unwrap());
    assert!(!db.add_quiz_question(&quiz, &q2).unwrap()); // already a member
    assert_eq!(db.quiz_question_ids(&quiz).unwrap(), vec![q1.clone(), q2.clone()]);

    assert!(db.remove_quiz_question(&quiz, &q1).unwrap());
    assert!(!db.remove_quiz_question(&quiz, &q1).unwrap());
    assert_eq!(db.quiz_question_ids(&quiz).unwrap(), vec![q2]);
}

#[test]
fn attempt_answer_upsert_replaces_never_duplicates() {
    let db = db();
    let admin = seed_user(&db, "admin");
    let user = seed_user(&db, "user");
    let subject = seed_subject(&db, "sets");
    let q = seed_question(&db, "Union of disjoint sets?", &subject, &admin, true);
    let quiz = new_id();
    db.insert_quiz(&quiz, "Sets", &admin, true, std::slice::from_ref(&q)).unwrap();

    let attempt = new_id();
    db.insert_attempt(&attempt, &user, &quiz, &[]).unwrap();

    assert!(db.upsert_attempt_answer(&attempt, &q, 1).unwrap()); // inserted
    assert!(!db.upsert_attempt_answer(&attempt, &q, 2).unwrap()); // replaced

    let answers = db.get_attempt_answers(&attempt).unwrap();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].answer_key, 2);

    assert!(db.remove_attempt_answer(&attempt, &q).unwrap());
    assert!(!db.remove_attempt_answer(&attempt, &q).unwrap());
    assert!(db.get_attempt_answers(&attempt).unwrap().is_empty());
}

#[test]
fn attempts_are_owner_scoped() {
    let db = db();
    let admin = seed_user(&db, "admin");
    let user = seed_user(&db, "user");
    let other = seed_user(&db, "other");
    let quiz = new_id();
    db.insert_quiz(&quiz, "Empty", &admin, true, &[]).unwrap();

    let attempt = new_id();
    db.insert_attempt(&attempt, &user, &quiz, &[]).unwrap();

    assert!(db.get_attempt(&attempt, &user).unwrap().is_some());
    assert!(db.get_attempt(&attempt, &other).unwrap().is_none());
    assert_eq!(db.list_attempt_ids(&user, Some(&quiz)).unwrap(), vec![attempt.clone()]);
    assert!(db.list_attempt_ids(&other, None).unwrap().is_empty());

    assert!(!db.delete_attempt(&attempt, &other).unwrap());
    assert!(db.delete_attempt(&attempt, &user).unwrap());
}

#[test]
fn question_update_rewrites_answers() {
    let db = db();
    let alice = seed_user(&db, "alice");
    let subject = seed_subject(&db, "primes");
    let q = seed_question(&db, "Smallest prime?", &subject, &alice, false);

    let mut row = db.get_question(&q).unwrap().unwrap();
    row.correct_answer_key = 3;
    let answers = [
        AnswerRow { key: 3, text: "2".into() },
        AnswerRow { key: 4, text: "1".into() },
    ];
    db.update_question(&row, &answers).unwrap();

    assert_eq!(db.correct_answer_key(&q).unwrap(), Some(3));
    assert_eq!(db.answer_keys(&q).unwrap(), vec![3, 4]);
}

#[test]
fn leaderboards_order_users() {
    let db = db();
    let prolific = seed_user(&db, "prolific");
    let quiet = seed_user(&db, "quiet");
    let voter = seed_user(&db, "voter");
    let subject = seed_subject(&db, "misc");

    let q1 = seed_question(&db, "First verified", &subject, &prolific, true);
    let _q2 = seed_question(&db, "Second verified", &subject, &prolific, true);
    let _unverified = seed_question(&db, "Pending", &subject, &quiet, false);

    db.cast_vote(&q1, &voter, true).unwrap();

    let by_verified = db.users_by_verified_count().unwrap();
    assert_eq!(by_verified.first(), Some(&prolific));

    let by_votes = db.users_by_total_net_votes().unwrap();
    assert_eq!(by_votes.first(), Some(&prolific));
}

#[test]
fn voteless_verified_questions_do_not_penalize_the_vote_leaderboard() {
    let db = db();
    let uploader = seed_user(&db, "uploader");
    let idle = seed_user(&db, "idle");
    let voter = seed_user(&db, "voter");
    let subject = seed_subject(&db, "misc");

    // Three verified questions, only one of them ever voted on: the two
    // voteless ones must count as 0, leaving the uploader at net +1.
    let voted = seed_question(&db, "Voted on", &subject, &uploader, true);
    let _quiet1 = seed_question(&db, "Never voted one", &subject, &uploader, true);
    let _quiet2 = seed_question(&db, "Never voted two", &subject, &uploader, true);
    db.cast_vote(&voted, &voter, true).unwrap();

    let by_votes = db.users_by_total_net_votes().unwrap();
    assert_eq!(by_votes.first(), Some(&uploader));

    // A downvote still counts as -1, dropping the uploader below the
    // zero-score users.
    db.cast_vote(&voted, &voter, false).unwrap();
    let by_votes = db.users_by_total_net_votes().unwrap();
    assert_eq!(by_votes.last(), Some(&uploader));
    assert!(by_votes.contains(&idle));
}
