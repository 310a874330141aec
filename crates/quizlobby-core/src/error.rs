//! Core error types for quizlobby-core.
//!
//! No error in this crate is fatal to the hosting screen: eligibility
//! failures resolve fail-closed, claim failures leave the popup retryable,
//! and marker-write failures close the popup optimistically.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for quizlobby-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Backend request errors (eligibility fetches, claims)
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// User-initiated claim failed server-side
    #[error("Claim error: {0}")]
    Claim(#[from] ClaimError),

    /// Seen/claimed marker store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Errors from the managed backend.
///
/// Providers translate every variant into `is_eligible = false`; a failed
/// check never reaches the sequencer as an error.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Backend returned status {status} for {endpoint}")]
    Status { endpoint: String, status: u16 },

    /// Base URL could not be parsed or joined
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Errors from a user-initiated claim.
#[derive(Error, Debug)]
pub enum ClaimError {
    /// The backend processed the claim and said no
    #[error("Claim rejected: {reason}")]
    Rejected { reason: String },

    /// The claim request never completed
    #[error("Claim request failed: {0}")]
    Transport(#[from] BackendError),

    /// The provider has nothing claimable in its current state
    #[error("Nothing to claim")]
    NothingToClaim,
}

/// Errors from the seen/claimed marker store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to read or parse the marker file
    #[error("Failed to load markers from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to serialize or write the marker file
    #[error("Failed to save markers to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Platform config directory could not be determined or created
    #[error("Could not prepare data directory: {0}")]
    DataDir(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
