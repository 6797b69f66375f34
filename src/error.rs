//! Error types for the drive_upload crate.

use thiserror::Error;

/// Errors that can occur when interacting with Google Drive.
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Token exchange failed: {0}")]
    TokenExchangeError(String),

    #[error("Failed to parse token cache: {0}")]
    TokenCacheError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Ambiguous subdirectory name: {0}")]
    AmbiguousFolder(String),

    #[error("Cannot resolve an empty directory path")]
    EmptyPath,

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid file pattern: {0}")]
    PatternError(#[from] regex::Error),

    #[error("Directory walk failed: {0}")]
    WalkError(#[from] walkdir::Error),
}

/// Result type alias for DriveError.
pub type Result<T> = std::result::Result<T, DriveError>;
