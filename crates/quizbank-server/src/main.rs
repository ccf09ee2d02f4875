use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use quizbank_api::generate::CohereGenerator;
use quizbank_api::state::{AppState, AppStateInner};
use quizbank_api::{attempts, auth, leaderboard, questions, quizzes, subjects, users, voting};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizbank=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("QUIZBANK_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("QUIZBANK_DB_PATH").unwrap_or_else(|_| "quizbank.db".into());
    let host = std::env::var("QUIZBANK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("QUIZBANK_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let cohere_api_key = std::env::var("COHERE_API_KEY").unwrap_or_default();
    let cohere_model =
        std::env::var("COHERE_MODEL").unwrap_or_else(|_| "command-r-08-2024".into());

    // Init database
    let db = quizbank_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        generator: Box::new(CohereGenerator::new(cohere_api_key, cohere_model)),
    });

    let app = Router::new()
        .route("/", get(health))
        .route("/user/signup", post(auth::signup))
        .route("/user/login", post(auth::login))
        .route("/user/logout", post(auth::logout))
        .route("/user/me", get(auth::me))
        .route("/user/{id}", get(users::get_user).put(users::set_admin))
        .route("/subject", get(subjects::list_subjects).post(subjects::create_subject))
        .route("/subject/search", get(subjects::search_subjects))
        .route(
            "/subject/{id}",
            get(subjects::get_subject)
                .put(subjects::update_subject)
                .delete(subjects::delete_subject),
        )
        .route("/question", get(questions::list_questions).post(questions::create_question))
        .route("/question/search", get(questions::search_questions))
        .route("/question/difficulties", get(questions::difficulty_levels))
        .route("/question/mutate", post(questions::mutate_question))
        .route(
            "/question/{id}",
            get(questions::get_question)
                .put(questions::update_question)
                .delete(questions::delete_question),
        )
        .route("/question/{id}/verify", put(questions::verify_question))
        .route("/quiz", get(quizzes::list_quizzes).post(quizzes::create_quiz))
        .route("/quiz/search", get(quizzes::search_quizzes))
        .route(
            "/quiz/{id}",
            get(quizzes::get_quiz).put(quizzes::update_quiz).delete(quizzes::delete_quiz),
        )
        .route(
            "/quiz/{id}/questions/{qid}",
            post(quizzes::add_question).delete(quizzes::remove_question),
        )
        .route("/attempt", get(attempts::list_attempts).post(attempts::create_attempt))
        .route(
            "/attempt/{id}",
            get(attempts::get_attempt).delete(attempts::delete_attempt),
        )
        .route(
            "/attempt/{id}/answers/{qid}",
            post(attempts::submit_answer).delete(attempts::remove_answer),
        )
        .route("/voting/{qid}/upvote", post(voting::upvote))
        .route("/voting/{qid}/downvote", post(voting::downvote))
        .route("/voting/{qid}", get(voting::get_counts).delete(voting::unvote))
        .route("/leaderboard/verified", get(leaderboard::by_verified))
        .route("/leaderboard/totalUpvotes", get(leaderboard::by_total_upvotes))
        .layer(middleware::from_fn_with_state(state.clone(), quizbank_api::middleware::identify))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Quizbank server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> &'static str {
    "Working normally."
}
