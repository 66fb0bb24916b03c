use reqwest::StatusCode;
use thiserror::Error;

use crate::api::error::truncate_body;

/// Failure to persist or remove the session document.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Login failure. The previous session, if any, is left in place.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials: {detail}")]
    InvalidCredentials { detail: String },

    #[error("Login rejected with status {status}: {}", truncate_body(.body))]
    Rejected { status: StatusCode, body: String },

    #[error("Network error during login: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid login response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}
