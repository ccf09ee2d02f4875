pub mod attempts;
pub mod auth;
pub mod error;
pub mod generate;
pub mod leaderboard;
pub mod middleware;
pub mod questions;
pub mod quizzes;
pub mod state;
pub mod subjects;
pub mod users;
pub mod voting;

mod util;
