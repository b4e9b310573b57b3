//! Error types for sitedeploy

use thiserror::Error;

/// Result type alias for sitedeploy operations
pub type Result<T> = std::result::Result<T, DeployError>;

/// Main error type for sitedeploy
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Build failed: {0}")]
    Build(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    Checksum {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DeployError {
    /// Whether this error class can only be raised before the bucket is touched.
    pub fn is_fatal_before_mutation(&self) -> bool {
        matches!(
            self,
            DeployError::Settings(_)
                | DeployError::Build(_)
                | DeployError::Fetch(_)
                | DeployError::Credentials(_)
                | DeployError::InvalidEvent(_)
                | DeployError::Config(_)
        )
    }

    /// Process exit code used by the binaries
    pub fn exit_code(&self) -> i32 {
        match self {
            DeployError::InvalidEvent(_) | DeployError::Config(_) => 2,
            DeployError::Build(_) => 3,
            DeployError::Checksum { .. } => 4,
            _ => 1,
        }
    }
}
