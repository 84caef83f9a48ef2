//! Custom error types for the simulation engine
//!
//! Every failure here is recoverable: validation and capacity errors go back
//! to the caller, provider errors degrade the roster to its last known state.

use thiserror::Error;

/// Top-level simulation errors
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Position ledger full: {open} of {max} positions open")]
    Capacity { open: usize, max: usize },

    #[error("Position not found: {id}")]
    NotFound { id: u64 },

    #[error("Price provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Price/oracle provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} unavailable: {reason}")]
    Unavailable { provider: String, reason: String },

    #[error("Stale price for {id}: {age_secs}s old (max: {max_age_secs}s)")]
    Stale {
        id: String,
        age_secs: i64,
        max_age_secs: i64,
    },

    #[error("{provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn unavailable(provider: &str, reason: impl Into<String>) -> Self {
        ProviderError::Unavailable {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
