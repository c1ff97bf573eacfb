use thiserror::Error;

/// Every failure the gateway can hand back to a caller.
///
/// Stage failures are recorded in conversation memory before being returned, so
/// presentation code renders these rather than retrying on its own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Required connection settings are absent; the system refuses all operations
    #[error("Configuration error: {message}")]
    Configuration { message: String, fields: Vec<String> },

    /// The language model was unreachable or returned unusable text
    #[error("Query generation failed: {message}")]
    Generation { message: String },

    /// The candidate statement was refused by the safety validator and never executed
    #[error("Query rejected: {reason}")]
    SafetyRejection { reason: String, statement: String },

    /// The database reported an error while running the statement
    #[error("Failed to execute query: {message}")]
    Execution { message: String },

    /// No pooled connection could be acquired in time
    #[error("Connection pool exhausted: {message}")]
    ResourceExhaustion { message: String },
}

/// Discriminant of [`GatewayError`], for branching and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Generation,
    SafetyRejection,
    Execution,
    ResourceExhaustion,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Generation => write!(f, "generation"),
            ErrorKind::SafetyRejection => write!(f, "safety_rejection"),
            ErrorKind::Execution => write!(f, "execution"),
            ErrorKind::ResourceExhaustion => write!(f, "resource_exhaustion"),
        }
    }
}

impl GatewayError {
    pub fn configuration(fields: Vec<String>) -> Self {
        let message = if fields.is_empty() {
            "database connection is not configured".to_string()
        } else {
            format!("missing database settings: {}", fields.join(", "))
        };
        Self::Configuration { message, fields }
    }

    pub fn generation<S: Into<String>>(message: S) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    pub fn safety_rejection<R: Into<String>, S: Into<String>>(reason: R, statement: S) -> Self {
        Self::SafetyRejection {
            reason: reason.into(),
            statement: statement.into(),
        }
    }

    pub fn execution<S: Into<String>>(message: S) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    pub fn resource_exhaustion<S: Into<String>>(message: S) -> Self {
        Self::ResourceExhaustion {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Generation { .. } => ErrorKind::Generation,
            Self::SafetyRejection { .. } => ErrorKind::SafetyRejection,
            Self::Execution { .. } => ErrorKind::Execution,
            Self::ResourceExhaustion { .. } => ErrorKind::ResourceExhaustion,
        }
    }

    /// Whether the session can keep going after this error.
    ///
    /// Only a missing configuration is terminal.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Configuration { .. })
    }
}
