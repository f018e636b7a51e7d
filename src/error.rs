//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror. Only
//! transport and API failures are surfaced to callers; envelope drift and
//! decode failures are absorbed by the dispatcher and normalizer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("No interests found: please select your interests first")]
    MissingInterests,

    #[error("Request cancelled")]
    Cancelled,

    #[error("Task error: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, Error>;
