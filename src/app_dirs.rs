use directories::ProjectDirs;
use std::path::PathBuf;

/// Where the leaderboard database lives
pub struct AppDirs;

impl AppDirs {
    pub fn db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("campus-guess");
            Some(state_dir.join("leaderboard.db"))
        } else {
            ProjectDirs::from("", "", "campus-guess")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("leaderboard.db"))
        }
    }
}
