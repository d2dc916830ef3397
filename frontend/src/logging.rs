use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive that overrides the
/// configured level.
pub const LOG_ENV: &str = "GANTRY_LOG";

/// Install the global subscriber. Output goes to stderr, or to `log_file`
/// (truncated) when given.
pub fn init(level: &str, log_file: Option<&Path>) -> Result<(), String> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| format!("invalid log level '{level}': {e}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| format!("unable to open log file {}: {e}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    }
    .map_err(|e| e.to_string())
}
