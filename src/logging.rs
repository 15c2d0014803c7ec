/// Logging setup.
///
/// The terminal is in raw mode on the alternate screen while the game
/// runs, so records go to a file instead of stderr. `RUST_LOG` wins over
/// the configured level. If the file cannot be opened, logging stays off.

use std::fs::OpenOptions;
use std::path::Path;

use env_logger::{Builder, Env, Target};

/// Returns false when no logger could be installed.
pub fn init(log_file: &Path, default_level: &str) -> bool {
    let file = match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(f) => f,
        Err(_) => return false,
    };

    Builder::from_env(Env::default().default_filter_or(default_level))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unopenable_file_disables_logging() {
        assert!(!init(Path::new("/nonexistent/boxpusher/dir/x.log"), "info"));
    }
}
