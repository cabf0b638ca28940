//! Failure classification for weather lookups.

use thiserror::Error;

/// Coarse failure category shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The city name was empty.
    InvalidInput,
    /// The API reported that no such city exists.
    NotFound,
    /// The request was cancelled before it completed.
    Cancelled,
    /// Network failure, unexpected status or malformed response.
    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::InvalidInput => "invalid_input",
            FailureKind::NotFound => "not_found",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("City name cannot be empty!")]
    InvalidInput,

    #[error("City not found.")]
    NotFound,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Weather API request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed weather response: {0}")]
    Malformed(String),

    #[error("Request cancelled.")]
    Cancelled,
}

impl FetchError {
    /// Classify this error. Parse and transport failures both land in `Unknown`.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidInput => FailureKind::InvalidInput,
            Self::NotFound => FailureKind::NotFound,
            Self::Cancelled => FailureKind::Cancelled,
            Self::Network(_) | Self::Status { .. } | Self::Malformed(_) => FailureKind::Unknown,
        }
    }
}
