use thiserror::Error;

/// Unified error type for Pandora.
#[derive(Error, Debug)]
pub enum PandoraError {
    #[error("Invalid show: {0}")]
    InvalidShow(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl PandoraError {
    /// Process exit code used by the CLI when a command fails with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            PandoraError::InvalidShow(_) => 2,
            PandoraError::ConfigError(_) => 78,
            PandoraError::Io(_) => 74,
            PandoraError::Serde(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_variant_prefix() {
        let err = PandoraError::InvalidShow("name must not be empty".into());
        assert_eq!(err.to_string(), "Invalid show: name must not be empty");

        let err = PandoraError::ConfigError("missing field `level`".into());
        assert_eq!(err.to_string(), "Config error: missing field `level`");
    }

    #[test]
    fn io_error_converts_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err: PandoraError = io.into();
        assert!(matches!(err, PandoraError::Io(_)));
        assert_eq!(err.exit_code(), 74);
    }

    #[test]
    fn serde_error_converts_via_from() {
        let serde_err = serde_json::from_str::<Vec<u8>>("not json").unwrap_err();
        let err: PandoraError = serde_err.into();
        assert!(matches!(err, PandoraError::Serde(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn invalid_show_has_usage_exit_code() {
        assert_eq!(PandoraError::InvalidShow(String::new()).exit_code(), 2);
        assert_eq!(PandoraError::ConfigError(String::new()).exit_code(), 78);
    }
}
