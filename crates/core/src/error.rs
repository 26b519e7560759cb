use thiserror::Error;

pub type TargetingResult<T> = Result<T, TargetingError>;

#[derive(Error, Debug)]
pub enum TargetingError {
    /// Neither a response probability nor a precomputed expected profit is available.
    #[error("No response probability or expected profit available: {0}")]
    MissingInputKind(String),

    #[error("Top-N rule requires a positive top_n, got {0:?}")]
    InvalidTopN(Option<i64>),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("Required column '{0}' not found")]
    MissingColumn(String),

    #[error("Invalid value '{value}' in column '{column}' at line {line}")]
    InvalidValue {
        line: u64,
        column: String,
        value: String,
    },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl TargetingError {
    /// Whether the error stems from the caller's input or parameters rather
    /// than from the environment.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::MissingInputKind(_)
                | Self::InvalidTopN(_)
                | Self::InvalidScenario(_)
                | Self::MissingColumn(_)
                | Self::InvalidValue { .. }
                | Self::Parse { .. }
        )
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingInputKind(_) => "missing_input_kind",
            Self::InvalidTopN(_) => "invalid_top_n",
            Self::InvalidScenario(_) => "invalid_scenario",
            Self::MissingColumn(_) => "missing_column",
            Self::InvalidValue { .. } => "invalid_value",
            Self::Parse { .. } => "parse_error",
            Self::Config(_) => "config_error",
            Self::Serialization(_) => "serialization_error",
            Self::Io(_) => "io_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<config::ConfigError> for TargetingError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_classification() {
        assert!(TargetingError::InvalidTopN(Some(0)).is_user_facing());
        assert!(TargetingError::MissingInputKind(String::new()).is_user_facing());
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(!TargetingError::from(io).is_user_facing());
    }

    #[test]
    fn test_missing_input_kind_lists_columns() {
        let err = TargetingError::MissingInputKind("columns present: id, zip_bin".to_string());
        let msg = err.to_string();
        assert!(msg.contains("zip_bin"));
        assert_eq!(err.code(), "missing_input_kind");
    }
}
