mod attempts;
mod leaderboard;
mod questions;
mod quizzes;
mod subjects;
mod users;
mod votes;
