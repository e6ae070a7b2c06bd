//! CLI subcommands.

pub mod resolve;
pub mod snapshot;

use thiserror::Error;

/// Errors shared by the subcommands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Platform API error.
    #[error(transparent)]
    Platform(#[from] storehost_platform::PlatformError),

    /// Fetching a page failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The page did not carry a decodable snapshot.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Output could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn required_env(key: &'static str) -> Result<String, CommandError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(CommandError::MissingEnvVar(key))
}
