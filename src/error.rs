//! Error types for fetching profiles and producing cards

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias for card operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching a profile or exporting a card
#[derive(Error, Debug)]
pub enum Error {
    /// The identifier does not resolve to an account
    #[error("User not found")]
    NotFound,

    /// API quota exhausted
    #[error("{}", rate_limit_message(.reset_at))]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    /// Any other non-2xx response
    #[error("Error: {status} {reason}")]
    Http { status: u16, reason: String },

    /// Transport-level failure (DNS, connect, TLS, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Failed to rasterize or encode the card
    #[error("Rendering failed: {0}")]
    Render(String),

    /// Failed to locate or parse a font
    #[error("Font error: {0}")]
    Font(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn rate_limit_message(reset_at: &Option<DateTime<Utc>>) -> String {
    let mut message = String::from("GitHub API rate limit exceeded.");
    if let Some(at) = reset_at {
        message.push_str(&format!(" Rate limit resets at {}.", at.format("%H:%M:%S UTC")));
    }
    message.push_str(" Try again later or add a GitHub personal access token.");
    message
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Decode(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}
