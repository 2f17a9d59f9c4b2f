use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Invalid escape entry {entry:?}: must be exactly one character")]
    InvalidEscapeChar { entry: String },
}

impl RelayError {
    /// Short error code string, used as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::Config(_) => "CONFIG_ERROR",
            RelayError::ConfigNotFound { .. } => "CONFIG_NOT_FOUND",
            RelayError::InvalidEscapeChar { .. } => "INVALID_ESCAPE_CHAR",
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
