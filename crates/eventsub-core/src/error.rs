use thiserror::Error;

/// Core error types for EventSub operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid event subscription ID: {0}")]
    InvalidId(String),

    #[error("Invalid timestamp: {0}")]
    InvalidDateTime(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new InvalidId error
    pub fn invalid_id(message: impl Into<String>) -> Self {
        Self::InvalidId(message.into())
    }

    /// Create a new InvalidDateTime error
    pub fn invalid_date_time(message: impl Into<String>) -> Self {
        Self::InvalidDateTime(message.into())
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidId(_) | Self::InvalidDateTime(_) | Self::Validation(_) => {
                ErrorCategory::Validation
            }
            Self::JsonError(_) => ErrorCategory::Serialization,
        }
    }
}

/// A locally detected configuration problem.
///
/// Validation errors never reach the remote API. `field` is the flat
/// configuration field at fault, e.g. `advanced_filter[2]` or
/// `dead_letter_identity`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{field}`: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Validation,
    Serialization,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Serialization => write!(f, "serialization"),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
