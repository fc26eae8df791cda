//! Error types for forge and git operations

use thiserror::Error;

/// Forge and version-control errors
#[derive(Debug, Error)]
pub enum ForgeError {
    // ============ Configuration Errors ============
    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid remote URL {url}: {reason}")]
    InvalidRemote { url: String, reason: String },

    // ============ Network Errors ============
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Request timed out: {message}")]
    Timeout { message: String },

    #[error("Authentication failed: {message}")]
    AuthFailed { message: String },

    #[error("Failed to upload release asset {path}: {message}")]
    UploadFailed { path: String, message: String },

    // ============ Git Errors ============
    #[error("{command} failed: {stderr}")]
    GitFailed { command: String, stderr: String },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ForgeError {
    /// Whether the error came from the network or the forge API
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ForgeError::HttpError { .. }
                | ForgeError::NetworkError { .. }
                | ForgeError::Timeout { .. }
                | ForgeError::AuthFailed { .. }
                | ForgeError::UploadFailed { .. }
        )
    }
}

/// Result type for forge operations
pub type Result<T> = std::result::Result<T, ForgeError>;

impl From<reqwest::Error> for ForgeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ForgeError::Timeout {
                message: e.to_string(),
            }
        } else if e.is_connect() {
            ForgeError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else if e.is_decode() {
            ForgeError::Serialization(e.to_string())
        } else if let Some(status) = e.status() {
            ForgeError::HttpError {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            ForgeError::NetworkError {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for ForgeError {
    fn from(e: serde_json::Error) -> Self {
        ForgeError::Serialization(e.to_string())
    }
}
