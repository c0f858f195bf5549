use directories::ProjectDirs;
use std::path::PathBuf;

/// Where the game keeps its store, history and log
pub struct AppDirs;

impl AppDirs {
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("dailyword"),
            )
        } else {
            ProjectDirs::from("", "", "dailyword").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("store.db"))
    }

    pub fn history_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("history.csv"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("dailyword.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_share_the_state_dir() {
        let Some(dir) = AppDirs::state_dir() else {
            return;
        };
        assert!(dir.ends_with("dailyword"));
        assert_eq!(AppDirs::db_path(), Some(dir.join("store.db")));
        assert_eq!(AppDirs::history_path(), Some(dir.join("history.csv")));
        assert_eq!(AppDirs::log_path(), Some(dir.join("dailyword.log")));
    }
}
