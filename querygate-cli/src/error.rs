use querygate_core::{ErrorKind, GatewayError};
use thiserror::Error;

/// Main error type for the querygate CLI
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// A gateway operation failed
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error: {0:#}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Get the exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            CliError::Io(_) => 3,
            CliError::Gateway(err) => match err.kind() {
                ErrorKind::Configuration => 2,
                ErrorKind::SafetyRejection => 4,
                ErrorKind::Generation => 5,
                ErrorKind::Execution => 6,
                ErrorKind::ResourceExhaustion => 7,
            },
            CliError::Other(_) => 1,
        }
    }
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Other(err.into())
    }
}
