use crate::error::CliError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn build_filter(verbose: bool) -> Result<EnvFilter, CliError> {
    let default_level = if verbose { "debug" } else { "info" };

    // RUST_LOG wins over --verbose when set
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| CliError::Config(format!("Failed to create log filter: {}", e)))
}

/// Initialize logging with environment-based log level filtering.
///
/// Logs go to stderr so query output on stdout stays clean.
pub fn init_logging(verbose: bool) -> Result<(), CliError> {
    let env_filter = build_filter(verbose)?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| CliError::Config(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter() {
        assert!(build_filter(false).is_ok());
        assert!(build_filter(true).is_ok());
    }

    #[test]
    fn test_init_logging_once() {
        // Only one global subscriber per process; this is the only test that installs it
        assert!(init_logging(false).is_ok());
    }
}
