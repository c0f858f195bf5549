use std::fs::{self, OpenOptions};
use std::path::Path;

use env_logger::{Builder, Env, Target};

/// Route `log` output to `path`, since the terminal belongs to the TUI.
///
/// `RUST_LOG` picks the filter, default `info`. Returns false when the file
/// can't be opened or a logger is already installed; the game runs either way.
pub fn init_file_logger(path: &Path) -> bool {
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return false;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return false;
    };

    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_secs()
        .try_init()
        .is_ok()
}

/// Plain stderr logger for the non-interactive commands.
pub fn init_stderr_logger() -> bool {
    Builder::from_env(Env::default().default_filter_or("warn"))
        .target(Target::Stderr)
        .try_init()
        .is_ok()
}
