//! Error types for clipglot.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipglotError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Translation backend errors
    #[error("Translation backend credential missing: {message}")]
    BackendCredential { message: String },

    #[error("Translation request failed: {message}")]
    BackendRequest { message: String },

    #[error("Translation backend returned an unusable response: {message}")]
    BackendResponse { message: String },

    // Durable store errors
    #[error("Translation store error: {message}")]
    Store { message: String },

    // Snapshot source errors
    #[error("Snapshot source failed: {message}")]
    Source { message: String },

    // IPC errors
    #[error("IPC socket error: {message}")]
    IpcSocket { message: String },

    #[error("IPC protocol error: {message}")]
    IpcProtocol { message: String },

    #[error("IPC connection failed: {message}")]
    IpcConnection { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ClipglotError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = ClipglotError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_backend_credential_display() {
        let error = ClipglotError::BackendCredential {
            message: "no api key configured".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Translation backend credential missing: no api key configured"
        );
    }

    #[test]
    fn test_store_error_display() {
        let error = ClipglotError::Store {
            message: "disk full".to_string(),
        };
        assert_eq!(error.to_string(), "Translation store error: disk full");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file missing");
        let error: ClipglotError = io_error.into();
        assert!(error.to_string().contains("file missing"));
    }

    #[test]
    fn test_other_error_passthrough() {
        let error = ClipglotError::Other("something odd".to_string());
        assert_eq!(error.to_string(), "something odd");
    }
}
