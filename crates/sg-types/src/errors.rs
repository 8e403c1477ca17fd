use thiserror::Error;

/// Main error type for the searchgrid system
#[derive(Error, Debug)]
pub enum SgError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures raised while walking a configuration tree
#[derive(Error, Debug)]
pub enum GridError {
    #[error("Cycle detected in configuration tree at {path}")]
    CycleDetected { path: String },

    #[error("Configuration tree deeper than {limit} levels at {path}")]
    DepthExceeded { limit: usize, path: String },

    #[error("Empty candidate list for parameter {path}")]
    EmptyCandidates { path: String },
}

/// Result type alias for searchgrid operations
pub type SgResult<T> = Result<T, SgError>;

/// Macro for creating invalid configuration errors
#[macro_export]
macro_rules! invalid_config {
    ($($arg:tt)*) => {
        $crate::SgError::InvalidConfiguration(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::SgError::Internal(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = GridError::DepthExceeded {
            limit: 4,
            path: "outer__inner".to_string(),
        };

        assert!(error.to_string().contains("deeper than 4"));
        assert!(error.to_string().contains("outer__inner"));
    }

    #[test]
    fn test_error_conversion() {
        let grid_error = GridError::CycleDetected {
            path: "a__b".to_string(),
        };
        let sg_error: SgError = grid_error.into();

        match sg_error {
            SgError::Grid(GridError::CycleDetected { path }) => assert_eq!(path, "a__b"),
            other => panic!("Expected Grid error, got {other:?}"),
        }
    }

    #[test]
    fn test_macros() {
        let config_err = invalid_config!("not fit-capable: {}", "Scaler");
        assert!(matches!(config_err, SgError::InvalidConfiguration(_)));
        assert!(config_err.to_string().contains("Scaler"));

        let internal_err = internal_error!("Something went wrong");
        assert!(matches!(internal_err, SgError::Internal(_)));
    }
}
