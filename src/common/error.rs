use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Insufficient data: {reason}")]
    InsufficientData { reason: String },

    #[error("Degenerate geometry: {reason}")]
    DegenerateGeometry { reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Invariant violated: {reason}")]
    InvariantViolation { reason: String },
}

impl DomainError {
    pub fn insufficient(reason: impl Into<String>) -> Self {
        DomainError::InsufficientData { reason: reason.into() }
    }

    pub fn degenerate(reason: impl Into<String>) -> Self {
        DomainError::DegenerateGeometry { reason: reason.into() }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        DomainError::InvalidInput { reason: reason.into() }
    }

    pub fn invariant(reason: impl Into<String>) -> Self {
        DomainError::InvariantViolation { reason: reason.into() }
    }

    /// Expected "no data yet" conditions that leave prior state untouched.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DomainError::InvariantViolation { .. })
    }
}

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Invalid configuration for `{field}`: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] anyhow::Error),

    #[error("Telemetry error: {0}")]
    Telemetry(String),

    #[error("Agent task error: {0}")]
    AgentTask(String),
}

impl ApplicationError {
    pub fn invalid_config(field: &str, reason: impl Into<String>) -> Self {
        ApplicationError::InvalidConfiguration {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
pub type ApplicationResult<T> = Result<T, ApplicationError>;
