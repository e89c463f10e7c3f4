//! Logging initialization.
//!
//! Tool output goes to stdout, so logs are written to a file in the platform
//! log directory unless stderr is requested.

use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const CRATES: [&str; 4] = ["symnav", "symnav_lsp", "symnav_symbols", "symnav_tools"];

/// Filter directives for the symnav crates at `level`.
fn directives(level: &str) -> String {
    CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize logging. `RUST_LOG` overrides the computed filter.
/// Returns the log file path if logging to file.
pub fn init_logging(verbose: bool, log_stderr: bool, level: Option<&str>) -> Option<PathBuf> {
    let level = if verbose { "debug" } else { level.unwrap_or("info") };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(level)));

    if log_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return None;
    }

    let log_dir = get_log_dir();
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Could not create log directory: {e}");
        return None;
    }

    let log_file = log_dir.join("symnav.log");
    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
    {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file: {e}");
            return None;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(file)
        .init();

    Some(log_file)
}

/// Get the log directory path.
pub fn get_log_dir() -> PathBuf {
    // macOS: ~/Library/Logs/symnav
    // Linux: ~/.local/state/symnav/logs
    // Windows: %LOCALAPPDATA%/symnav/logs

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = dirs::home_dir() {
            return home.join("Library/Logs/symnav");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(state_dir) = dirs::state_dir() {
            return state_dir.join("symnav/logs");
        }
        if let Some(home) = dirs::home_dir() {
            return home.join(".local/state/symnav/logs");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(local_app) = dirs::data_local_dir() {
            return local_app.join("symnav/logs");
        }
    }

    PathBuf::from(".symnav/logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_cover_all_crates() {
        assert_eq!(
            directives("debug"),
            "symnav=debug,symnav_lsp=debug,symnav_symbols=debug,symnav_tools=debug"
        );
    }

    #[test]
    fn test_log_dir_ends_with_symnav() {
        let dir = get_log_dir();
        assert!(dir.to_string_lossy().contains("symnav"));
    }
}
