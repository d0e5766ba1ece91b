// Library surface for the binary, headless play, and integration tests.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod geo;
pub mod leaderboard;
pub mod manifest;
pub mod play;
pub mod rounds;
pub mod session;

pub use error::GameError;
pub use geo::{distance, score_from_distance, Coordinate};
pub use leaderboard::{LeaderboardClient, ScoreEntry, ScoreStore};
pub use manifest::LocationRecord;
pub use rounds::{select_rounds, select_rounds_with};
pub use session::{GameSession, Phase, RoundResult, SessionState, SessionSummary};
